//! Signed download route for the local storage backend.
//!
//! S3 links point at the bucket directly; local links point here and carry an HMAC
//! token naming the object and its expiry.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use portal_core::AppError;
use portal_storage::keys::original_name;
use std::sync::Arc;

fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[utoipa::path(
    get,
    path = "/files/{token}",
    tag = "files",
    params(("token" = String, Path, description = "Signed download token")),
    responses(
        (status = 200, description = "File contents"),
        (status = 401, description = "Invalid or expired download link"),
        (status = 404, description = "File not found")
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "download"))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, HttpAppError> {
    let key = state.storage.verify_download_token(token.trim())?;
    let data = state.storage.download(&key).await?;

    let disposition = format!("attachment; filename=\"{}\"", original_name(&key));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&key))
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(data))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}
