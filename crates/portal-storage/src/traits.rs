//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid or expired download token")]
    InvalidToken,

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Write behaviour for [`Storage::put`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Replace an existing object instead of failing with `AlreadyExists`.
    pub overwrite: bool,
}

/// One object returned by [`Storage::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Storage abstraction trait
///
/// The document portal only needs a narrow surface: write an object under a known key,
/// enumerate a prefix, remove a batch of keys and hand out time-limited download links.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `key`.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        options: PutOptions,
    ) -> StorageResult<()>;

    /// Download a file by its storage key
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// List every object whose key starts with `prefix`. An empty prefix lists the bucket.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    /// Remove the given keys. Keys that do not exist are ignored.
    async fn remove(&self, keys: &[String]) -> StorageResult<()>;

    /// Generate a time-limited GET URL for `key`.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Check if a file exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Resolve a download token minted by [`Storage::signed_url`] back to its key.
    ///
    /// Only backends that serve downloads through the portal itself support this.
    fn verify_download_token(&self, _token: &str) -> StorageResult<String> {
        Err(StorageError::InvalidToken)
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

impl From<StorageError> for portal_core::AppError {
    fn from(err: StorageError) -> Self {
        use portal_core::AppError;
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("File not found: {}", key)),
            StorageError::AlreadyExists(key) => {
                AppError::Conflict(format!("A file already exists at {}", key))
            }
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired download link".to_string())
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}
