use crate::auth::CompanyContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{extract_document_form, validate_document};
use axum::{
    extract::{rejection::PathRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use portal_core::models::{ChecklistEntry, DocumentResponse};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "documents",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields: `doc_type` (document type name) and `file`"),
    responses(
        (status = 201, description = "Document stored; the updated checklist entry", body = ChecklistEntry),
        (status = 400, description = "Invalid document type, extension or form", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage or metadata write failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart, company), fields(company = %company.username))]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    company: CompanyContext,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ChecklistEntry>), HttpAppError> {
    let form = extract_document_form(multipart).await?;
    let (doc_type, file) = validate_document(form, &state.upload_limits)?;

    let entry = state
        .checklist
        .upload(&company.username, doc_type, file)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "documents",
    responses(
        (status = 200, description = "The company's documents, newest first", body = Vec<DocumentResponse>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    company: CompanyContext,
) -> Result<Json<Vec<DocumentResponse>>, HttpAppError> {
    let documents = state.checklist.list_documents(&company.username).await?;
    Ok(Json(documents))
}

#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Record id of the uploaded document")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "No such document for this company", body = ErrorResponse),
        (status = 500, description = "Record deleted but the file could not be removed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, company), fields(company = %company.username))]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    company: CompanyContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, HttpAppError> {
    let Path(id) = id?;
    state.checklist.delete(&company.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
