//! Operator account management. Every route here sits behind the admin guard.

use crate::auth::AdminContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use portal_core::models::{
    CompanyResponse, CompanySearchQuery, CreateCompanyRequest, DocumentResponse,
    UpdateCompanyRequest,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/admin/companies",
    tag = "admin",
    params(("search" = Option<String>, Query, description = "Case-insensitive match on username or company name")),
    responses(
        (status = 200, description = "Companies ordered by name", body = Vec<CompanyResponse>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Not an operator session", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    query: Result<Query<CompanySearchQuery>, QueryRejection>,
) -> Result<Json<Vec<CompanyResponse>>, HttpAppError> {
    let Query(query) = query?;
    let companies = state
        .accounts
        .list_companies(query.search.as_deref())
        .await?;
    Ok(Json(companies))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/companies",
    tag = "admin",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "All fields are required.", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(operator = %admin.username))]
pub async fn create_company(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyResponse>), HttpAppError> {
    let company = state.accounts.create_company(request).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/companies/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 400, description = "No changes supplied", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, id, request), fields(operator = %admin.username))]
pub async fn update_company(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    id: Result<Path<Uuid>, PathRejection>,
    ValidatedJson(request): ValidatedJson<UpdateCompanyRequest>,
) -> Result<Json<CompanyResponse>, HttpAppError> {
    let Path(id) = id?;
    let company = state.accounts.update_company(id, request).await?;
    Ok(Json(company))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/companies/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 204, description = "Company and its documents deleted"),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, id), fields(operator = %admin.username))]
pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, HttpAppError> {
    let Path(id) = id?;
    state.accounts.delete_company(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/companies/{id}/documents",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "The company's documents with download links", body = Vec<DocumentResponse>),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn company_documents(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<DocumentResponse>>, HttpAppError> {
    let Path(id) = id?;
    let company = state.accounts.find_company(id).await?;
    let documents = state.checklist.list_documents(&company.username).await?;
    Ok(Json(documents))
}
