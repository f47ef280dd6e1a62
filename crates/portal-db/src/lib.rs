//! Portal DB Library
//!
//! Table-store access for company accounts and uploaded-document metadata. Callers depend
//! on the [`CompanyStore`] and [`DocumentRecordStore`] traits; PostgreSQL repositories are
//! the production implementations.

pub mod db;

pub use db::{
    run_migrations, CompanyStore, DocumentRecordStore, PgCompanyRepository,
    PgDocumentRepository, UpsertOutcome,
};
#[cfg(any(test, feature = "memory"))]
pub use db::MemoryStore;
