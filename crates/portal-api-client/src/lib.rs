//! Shared HTTP client for the portal API.
//!
//! Provides a minimal client carrying an optional session token, generic JSON helpers
//! and domain methods (login, checklist, upload, account management). The CLI uses this
//! client directly.

pub mod api;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// API version prefix shared with the server.
pub use portal_core::constants::API_PREFIX;

/// Authentication strategy for the API.
#[derive(Clone, Debug, Default)]
pub enum Auth {
    /// No credentials; only the login routes and signed links work.
    #[default]
    Anonymous,
    /// `Authorization: Bearer {token}`
    Bearer(String),
}

/// A non-success response, carrying the server's message.
///
/// Returned inside `anyhow::Error`; use `downcast_ref::<ApiError>()` to inspect it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<String>,
}

impl ApiError {
    /// The session was rejected; the caller should log in again.
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

/// Build an [`ApiError`] from a status and raw body, preferring the JSON `error` field.
pub fn parse_error(status: StatusCode, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => ApiError {
            status,
            message: parsed.error,
            code: parsed.code,
        },
        Err(_) => ApiError {
            status,
            message: if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            },
            code: None,
        },
    }
}

/// HTTP client for the portal API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: &str, auth: Auth) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create client from environment: PORTAL_API_URL (default http://localhost:4000).
    pub fn from_env(auth: Auth) -> Result<Self> {
        let base_url = std::env::var("PORTAL_API_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string());
        Self::new(&base_url, auth)
    }

    /// Same client, different credentials.
    pub fn with_auth(&self, auth: Auth) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Anonymous => request,
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_error(status, &body).into())
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        self.json(request).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.json(self.client.post(self.build_url(path)).json(body))
            .await
    }

    /// POST without a body and deserialize response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.json(self.client.post(self.build_url(path))).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.json(self.client.put(self.build_url(path)).json(body))
            .await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        self.json(self.client.post(self.build_url(path)).multipart(form))
            .await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.client.delete(self.build_url(path))).await?;
        Ok(())
    }

    /// Fetch an absolute URL (signed download links) without credentials.
    pub async fn fetch_url(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status, &body).into());
        }
        let bytes = response.bytes().await.context("Failed to read download")?;
        Ok(bytes.to_vec())
    }
}

// Re-export domain response types for convenience.
pub use portal_core::models::{
    AdminLoginResponse, ChecklistEntry, ChecklistResponse, CompanyResponse, DocumentResponse,
    DocumentType, LoginResponse, SweepReport, UploadStatus,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let client = ApiClient::new("http://localhost:4000/", Auth::Anonymous).unwrap();
        assert_eq!(
            client.build_url("/api/v1/checklist"),
            "http://localhost:4000/api/v1/checklist"
        );
    }

    #[test]
    fn server_error_bodies_are_parsed() {
        let err = parse_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Session expired","code":"UNAUTHORIZED","recoverable":false}"#,
        );
        assert_eq!(err.message, "Session expired");
        assert_eq!(err.code.as_deref(), Some("UNAUTHORIZED"));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn plain_bodies_fall_back_to_text_or_reason() {
        let err = parse_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.message, "upstream down");

        let err = parse_error(StatusCode::NOT_FOUND, "");
        assert_eq!(err.message, "Not Found");
        assert!(!err.is_unauthorized());
    }
}
