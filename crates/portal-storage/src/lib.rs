//! Portal Storage Library
//!
//! Object storage for uploaded compliance documents: the [`Storage`] trait plus S3 and
//! local filesystem backends.
//!
//! # Storage key format
//!
//! Every document lives under its company's prefix: `{username}/{unix_millis}_{filename}`.
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! [`keys`] module so all backends and the sweeper agree on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use portal_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::UrlSigner;
pub use traits::{ObjectInfo, PutOptions, Storage, StorageError, StorageResult};
