use crate::auth::models::{AdminContext, CompanyContext, SessionClaims, SessionRole};
use crate::auth::session::SessionKeys;
use crate::error::HttpAppError;
use crate::utils::ip_extraction::ClientIp;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use portal_core::AppError;
use portal_services::AccountService;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionKeys,
    pub accounts: AccountService,
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

fn verified_claims(
    auth_state: &AuthState,
    request: &Request,
    required: SessionRole,
) -> Result<SessionClaims, AppError> {
    let claims = auth_state.sessions.verify(bearer_token(request)?)?;
    if claims.role != required {
        return Err(AppError::Forbidden(format!(
            "This action requires a {} session",
            required
        )));
    }
    Ok(claims)
}

fn reject(request: &Request, error: AppError) -> Response {
    let ip = request
        .extensions()
        .get::<ClientIp>()
        .map(|ClientIp(ip)| ip.as_str())
        .unwrap_or("unknown");
    tracing::info!(
        client_ip = %ip,
        path = %request.uri().path(),
        reason = %error,
        "Request rejected by session guard"
    );
    HttpAppError(error).into_response()
}

/// Guard for company routes: requires a valid company session for an account that still exists.
///
/// The account is looked up on every request so renamed or deleted companies are seen
/// immediately rather than when their token expires.
pub async fn company_auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match verified_claims(&auth_state, &request, SessionRole::Company) {
        Ok(claims) => claims,
        Err(e) => return reject(&request, e),
    };

    let Ok(company_id) = Uuid::parse_str(&claims.sub) else {
        let error = AppError::Unauthorized("Invalid session token".to_string());
        return reject(&request, error);
    };

    let company = match auth_state.accounts.find_company(company_id).await {
        Ok(company) => company,
        Err(AppError::NotFound(_)) => {
            let error = AppError::Unauthorized("Account no longer exists".to_string());
            return reject(&request, error);
        }
        Err(e) => return HttpAppError(e).into_response(),
    };

    request.extensions_mut().insert(CompanyContext {
        company_id: company.id,
        username: company.username,
    });
    next.run(request).await
}

/// Guard for operator routes: requires a valid admin session.
pub async fn admin_auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match verified_claims(&auth_state, &request, SessionRole::Admin) {
        Ok(claims) => {
            request.extensions_mut().insert(AdminContext {
                username: claims.username,
            });
            next.run(request).await
        }
        Err(e) => reject(&request, e),
    }
}
