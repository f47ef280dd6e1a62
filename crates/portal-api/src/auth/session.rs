//! HS256 session tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use portal_core::models::Company;
use portal_core::AppError;
use std::sync::Arc;

use super::models::{SessionClaims, SessionRole};

/// A freshly signed token and the moment it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            ttl,
        }
    }

    pub fn issue_company(&self, company: &Company) -> Result<IssuedSession, AppError> {
        self.issue(
            company.id.to_string(),
            company.username.clone(),
            SessionRole::Company,
        )
    }

    pub fn issue_admin(&self, operator: &str) -> Result<IssuedSession, AppError> {
        self.issue(operator.to_string(), operator.to_string(), SessionRole::Admin)
    }

    fn issue(
        &self,
        sub: String,
        username: String,
        role: SessionRole,
    ) -> Result<IssuedSession, AppError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub,
            username,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session: {}", e)))?;
        Ok(IssuedSession { token, expires_at })
    }

    /// Check signature and expiry. Every failure is a 401.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Session expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid session token".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn company() -> Company {
        Company {
            id: Uuid::new_v4(),
            username: "acme".to_string(),
            company_name: "Acme".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_company_session_verifies() {
        let keys = SessionKeys::new(SECRET, Duration::hours(1));
        let company = company();
        let session = keys.issue_company(&company).unwrap();

        let claims = keys.verify(&session.token).unwrap();
        assert_eq!(claims.sub, company.id.to_string());
        assert_eq!(claims.username, "acme");
        assert_eq!(claims.role, SessionRole::Company);
        assert_eq!(claims.exp, session.expires_at.timestamp());
    }

    #[test]
    fn expired_session_is_rejected() {
        let keys = SessionKeys::new(SECRET, Duration::seconds(-10));
        let session = keys.issue_admin("operator").unwrap();
        let err = keys.verify(&session.token).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Session expired");
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = SessionKeys::new(SECRET, Duration::hours(1));
        let theirs = SessionKeys::new("another-secret-another-secret-xx", Duration::hours(1));
        let session = theirs.issue_admin("operator").unwrap();
        assert!(matches!(
            ours.verify(&session.token),
            Err(AppError::Unauthorized(_))
        ));
    }
}
