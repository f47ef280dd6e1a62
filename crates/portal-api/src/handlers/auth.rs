//! Company and operator login.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::ip_extraction::ClientIp;
use axum::{extract::State, Json};
use portal_core::models::{AdminLoginResponse, LoginRequest, LoginResponse};
use portal_core::AppError;
use std::sync::Arc;

/// Refuse the attempt outright while the address is throttled.
async fn ensure_not_throttled(state: &AppState, ip: &str) -> Result<(), AppError> {
    match state.login_limiter.blocked_for(ip).await {
        Some(remaining) => Err(AppError::TooManyAttempts {
            retry_after_secs: remaining.as_secs().max(1),
        }),
        None => Ok(()),
    }
}

/// Count credential failures against the address; other errors pass through untouched.
async fn note_outcome<T>(
    state: &AppState,
    ip: &str,
    kind: &'static str,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            state.login_limiter.clear(ip).await;
            tracing::info!(client_ip = %ip, kind, outcome = "success", "Login attempt");
            Ok(value)
        }
        Err(AppError::Unauthorized(msg)) => {
            let blocked = state.login_limiter.record_failure(ip).await;
            tracing::info!(client_ip = %ip, kind, outcome = "failure", blocked, "Login attempt");
            Err(AppError::Unauthorized(msg))
        }
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpAppError> {
    ensure_not_throttled(&state, &ip).await?;

    let result = state
        .accounts
        .authenticate_company(&request.username, &request.password)
        .await;
    let company = note_outcome(&state, &ip, "company", result).await?;

    let session = state.sessions.issue_company(&company)?;
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        company: company.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    tag = "admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Operator session issued", body = AdminLoginResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse)
    )
)]
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AdminLoginResponse>, HttpAppError> {
    ensure_not_throttled(&state, &ip).await?;

    let result = state
        .accounts
        .authenticate_operator(&request.username, &request.password)
        .await;
    let operator = note_outcome(&state, &ip, "admin", result).await?;

    let session = state.sessions.issue_admin(&operator)?;
    Ok(Json(AdminLoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        username: operator,
    }))
}
