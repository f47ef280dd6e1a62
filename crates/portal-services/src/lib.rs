//! Portal Services Library
//!
//! Business operations of the document portal, written against the store and storage
//! traits so they run unchanged over PostgreSQL, S3, the local filesystem or the
//! in-memory test stores.

pub mod accounts;
pub mod checklist;
pub mod passwords;
pub mod sweeper;

pub use accounts::{AccountService, OperatorCredential};
pub use checklist::{ChecklistService, DocumentFile};
pub use passwords::PasswordHasher;
pub use sweeper::OrphanSweeper;
