//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything convertible into
//! `AppError` becomes an `HttpAppError` through `?` and renders with the same status,
//! body shape and logging.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{FromRequest, Request},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use portal_core::{AppError, ErrorMetadata, LogLevel};
use portal_storage::StorageError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::OnceLock;
use utoipa::ToSchema;

use crate::utils::upload::ValidationError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Log in again")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: IntoResponse and AppError both live in other crates)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let app = match err {
            ValidationError::FileTooLarge { size, max } => AppError::PayloadTooLarge(format!(
                "{} bytes exceeds the maximum of {} MB",
                size,
                max / 1024 / 1024
            )),
            other => AppError::InvalidInput(other.to_string()),
        };
        HttpAppError(app)
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for HttpAppError {
    fn from(rejection: PathRejection) -> Self {
        HttpAppError(AppError::BadRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        HttpAppError(AppError::BadRequest(rejection.body_text()))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                details = %error.detailed_message(),
                error_type = error_type,
                "Error occurred"
            );
        }
    }
}

static HIDE_DETAILS: OnceLock<bool> = OnceLock::new();

/// Hide error details from clients (production). Set once at startup; defaults to off.
pub fn set_hide_error_details(hide: bool) {
    let _ = HIDE_DETAILS.set(hide);
}

fn hide_error_details() -> bool {
    HIDE_DETAILS.get().copied().unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let show_details = !hide_error_details() && !app_error.is_sensitive();
        let body = ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::TooManyAttempts { retry_after_secs } = app_error {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_their_meaning() {
        let HttpAppError(err) = StorageError::NotFound("acme/1_a.pdf".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let HttpAppError(err) = StorageError::InvalidToken.into();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let HttpAppError(err) = StorageError::UploadFailed("timeout".to_string()).into();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn validation_errors_map_to_client_errors() {
        let HttpAppError(err) = ValidationError::FileTooLarge {
            size: 3 * 1024 * 1024,
            max: 1024 * 1024,
        }
        .into();
        match err {
            AppError::PayloadTooLarge(msg) => assert!(msg.contains("1 MB")),
            other => panic!("Expected PayloadTooLarge, got {:?}", other),
        }

        let HttpAppError(err) = ValidationError::EmptyFile.into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn too_many_attempts_sets_retry_after() {
        let response =
            HttpAppError(AppError::TooManyAttempts { retry_after_secs: 42 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn error_response_shape() {
        let response = ErrorResponse {
            error: "Document not found".to_string(),
            details: None,
            error_type: None,
            code: "NOT_FOUND".to_string(),
            recoverable: false,
            suggested_action: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["recoverable"], false);
        assert!(json.get("details").is_none());
    }
}
