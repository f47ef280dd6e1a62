use crate::auth::AdminContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use portal_core::models::SweepReport;
use std::sync::Arc;

/// Run the orphan sweep immediately.
#[utoipa::path(
    post,
    path = "/api/v1/admin/maintenance/sweep",
    tag = "admin",
    responses(
        (status = 200, description = "Sweep report", body = SweepReport),
        (status = 403, description = "Not an operator session", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn run_sweep(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
) -> Result<Json<SweepReport>, HttpAppError> {
    tracing::info!(operator = %admin.username, "Orphan sweep requested");
    let report = state.sweeper.sweep().await?;
    Ok(Json(report))
}
