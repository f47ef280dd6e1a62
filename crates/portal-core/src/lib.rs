//! Portal Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! the portal server, its storage and database layers, and the command-line client.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, PortalConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AdminLoginResponse, Checklist, ChecklistEntry, ChecklistResponse, Company, CompanyChanges,
    CompanyResponse, CompanySearchQuery, CreateCompanyRequest, DocumentResponse, DocumentType,
    DocumentUpsert, LoginRequest, LoginResponse, NewCompany, SweepReport, UpdateCompanyRequest,
    UploadStatus, UploadedDocument,
};
pub use storage_types::StorageBackend;
