use crate::auth::CompanyContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use portal_core::models::ChecklistResponse;
use std::sync::Arc;

/// The company's checklist, rebuilt from its stored records.
#[utoipa::path(
    get,
    path = "/api/v1/checklist",
    tag = "checklist",
    responses(
        (status = 200, description = "All ten document types with their status", body = ChecklistResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_checklist(
    State(state): State<Arc<AppState>>,
    company: CompanyContext,
) -> Result<Json<ChecklistResponse>, HttpAppError> {
    let checklist = state.checklist.load(&company.username).await?;
    Ok(Json(checklist))
}
