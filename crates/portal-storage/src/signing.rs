//! Signed, expiring download tokens for backends without native presigning.
//!
//! Token = base64url(expiry_ts (u64 BE) || key bytes || HMAC-SHA256(secret, expiry || key)).

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::traits::{StorageError, StorageResult};

const EXPIRY_LEN: usize = 8;
const MAC_LEN: usize = 32;

#[derive(Clone)]
pub struct UrlSigner {
    secret: Arc<[u8]>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
        }
    }

    fn mac(&self) -> StorageResult<Hmac<Sha256>> {
        Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|e| StorageError::ConfigError(format!("Invalid signing key: {}", e)))
    }

    /// Mint a token granting read access to `key` for `expires_in`.
    pub fn sign(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.sign_until(key, now_secs().saturating_add(expires_in.as_secs()))
    }

    fn sign_until(&self, key: &str, expiry_ts: u64) -> StorageResult<String> {
        let mut payload = Vec::with_capacity(EXPIRY_LEN + key.len() + MAC_LEN);
        payload.extend_from_slice(&expiry_ts.to_be_bytes());
        payload.extend_from_slice(key.as_bytes());

        let mut mac = self.mac()?;
        mac.update(&payload);
        payload.extend_from_slice(&mac.finalize().into_bytes());

        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(payload))
    }

    /// Check signature and expiry; returns the key.
    pub fn verify(&self, token: &str) -> StorageResult<String> {
        self.verify_at(token, now_secs())
    }

    fn verify_at(&self, token: &str, now: u64) -> StorageResult<String> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| StorageError::InvalidToken)?;
        if decoded.len() <= EXPIRY_LEN + MAC_LEN {
            return Err(StorageError::InvalidToken);
        }
        let (payload, tag) = decoded.split_at(decoded.len() - MAC_LEN);

        let mut mac = self.mac()?;
        mac.update(payload);
        mac.verify_slice(tag).map_err(|_| StorageError::InvalidToken)?;

        let mut expiry = [0u8; EXPIRY_LEN];
        expiry.copy_from_slice(&payload[..EXPIRY_LEN]);
        if now > u64::from_be_bytes(expiry) {
            return Err(StorageError::InvalidToken);
        }

        String::from_utf8(payload[EXPIRY_LEN..].to_vec()).map_err(|_| StorageError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_own_token() {
        let signer = UrlSigner::new("secret-secret-secret-secret-1234");
        let token = signer.sign("acme/1_iso.pdf", Duration::from_secs(60)).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), "acme/1_iso.pdf");
    }

    #[test]
    fn rejects_expired_token() {
        let signer = UrlSigner::new("k");
        let token = signer.sign_until("acme/1_iso.pdf", 100).unwrap();
        assert!(signer.verify_at(&token, 100).is_ok());
        assert!(matches!(
            signer.verify_at(&token, 101),
            Err(StorageError::InvalidToken)
        ));
    }

    #[test]
    fn rejects_foreign_or_tampered_token() {
        let signer = UrlSigner::new("k1");
        let token = signer.sign("acme/1_iso.pdf", Duration::from_secs(60)).unwrap();
        assert!(UrlSigner::new("k2").verify(&token).is_err());

        let mut bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&token)
            .unwrap();
        bytes[EXPIRY_LEN] ^= 0x01;
        let tampered = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        assert!(signer.verify(&tampered).is_err());
        assert!(signer.verify("not base64!").is_err());
    }
}
