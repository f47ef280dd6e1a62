//! bcrypt hashing on the blocking pool.

use portal_core::AppError;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Compare a password with a stored hash. A malformed hash never matches.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = hash.to_string();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?;

        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                Ok(false)
            }
        }
    }

    /// Spend one full verification on a throwaway hash, so a missing account costs the
    /// same as a wrong password.
    pub async fn burn_verification(&self, password: &str) -> Result<(), AppError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hash("portal-dummy-password"))
            .await?
            .clone();
        self.verify(password, &dummy).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("s3cret").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("s3cret", &hash).await.unwrap());
        assert!(!hasher.verify("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_never_matches() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("s3cret", "plaintext").await.unwrap());
        hasher.burn_verification("anything").await.unwrap();
    }
}
