//! Shared key layout for storage backends.
//!
//! Format: `{username}/{unix_millis}_{filename}`. The millisecond prefix keeps repeated
//! uploads of the same file name from colliding.

use crate::traits::{StorageError, StorageResult};

/// Build the key for a document uploaded by `username` at `unix_millis`.
///
/// `filename` must already be sanitized; see `portal-api`'s upload utilities.
pub fn document_key(username: &str, filename: &str, unix_millis: i64) -> String {
    format!("{}/{}_{}", username, unix_millis, filename)
}

/// Prefix that holds every object of one company.
pub fn company_prefix(username: &str) -> String {
    format!("{}/", username)
}

/// The file name a key was uploaded under, without the company and timestamp prefix.
pub fn original_name(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.split_once('_') {
        Some((millis, rest)) if !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => name,
    }
}

/// Reject keys that could escape a storage root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') || key.contains('\0') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        let key = document_key("acme", "iso.pdf", 1_718_000_000_000);
        assert_eq!(key, "acme/1718000000000_iso.pdf");
        assert!(key.starts_with(&company_prefix("acme")));
        assert_eq!(original_name(&key), "iso.pdf");
    }

    #[test]
    fn original_name_keeps_underscored_names() {
        assert_eq!(original_name("acme/17_hr_policy_v2.pdf"), "hr_policy_v2.pdf");
        assert_eq!(original_name("acme/hr_policy.pdf"), "hr_policy.pdf");
    }

    #[test]
    fn rejects_traversal() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("acme/1_a.pdf").is_ok());
    }
}
