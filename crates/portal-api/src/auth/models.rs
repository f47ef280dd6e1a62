use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portal_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Who a session belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Company,
    Admin,
}

impl Display for SessionRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SessionRole::Company => write!(f, "company"),
            SessionRole::Admin => write!(f, "admin"),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Company id, or the operator name for admin sessions.
    pub sub: String,
    pub username: String,
    pub role: SessionRole,
    pub iat: i64,
    pub exp: i64,
}

/// The logged-in company, inserted by the company guard.
#[derive(Debug, Clone)]
pub struct CompanyContext {
    pub company_id: Uuid,
    pub username: String,
}

/// The logged-in operator, inserted by the admin guard.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub username: String,
}

// Extracted from parts rather than `Extension` so they can sit next to `Multipart`.
impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CompanyContext>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Not logged in".to_string())))
    }
}

impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminContext>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Not logged in".to_string())))
    }
}
