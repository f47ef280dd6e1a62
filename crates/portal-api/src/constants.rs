//! HTTP-level constants.

pub use portal_core::constants::API_PREFIX;

/// Path of the signed download route served for the local storage backend.
pub const FILES_ROUTE: &str = "/files/{token}";

/// Multipart field carrying the document type name.
pub const DOC_TYPE_FIELD: &str = "doc_type";

/// Multipart field carrying the file bytes.
pub const FILE_FIELD: &str = "file";

/// Extra room on top of the document limit for multipart framing and the other fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
