//! Test helpers: build the application over in-memory tables and a temporary
//! local storage directory.
//!
//! Run from workspace root: `cargo test -p portal-api`. No database or Docker needed.

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use portal_api::constants::API_PREFIX;
use portal_api::setup::{routes, services};
use portal_api::state::AppState;
use portal_core::models::{ChecklistEntry, ChecklistResponse, CompanyResponse, LoginResponse};
use portal_core::{BaseConfig, Config, PortalConfig, StorageBackend};
use portal_db::MemoryStore;
use portal_storage::{LocalStorage, UrlSigner};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

pub const PUBLIC_BASE_URL: &str = "http://localhost:4000";
pub const JWT_SECRET: &str = "test-session-secret-at-least-32-characters";
pub const OPERATOR: &str = "operator";
pub const OPERATOR_PASSWORD: &str = "operator-password";
pub const MAX_FAILURES: u32 = 3;

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn test_config(storage_path: &str) -> Config {
    let admin_password_hash =
        bcrypt::hash(OPERATOR_PASSWORD, 4).expect("hash operator password");
    Config::new(PortalConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            jwt_secret: JWT_SECRET.to_string(),
            session_ttl_hours: 1,
            http_concurrency_limit: 100,
            // Tests pick their client address through X-Forwarded-For.
            trusted_proxy_count: 1,
            environment: "test".to_string(),
        },
        database_url: "postgresql://unused/portal".to_string(),
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: storage_path.to_string(),
        public_base_url: PUBLIC_BASE_URL.to_string(),
        signed_url_ttl_secs: 600,
        max_document_size_bytes: 64 * 1024,
        document_allowed_extensions: ["pdf", "docx", "xlsx", "png"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        admin_username: OPERATOR.to_string(),
        admin_password_hash,
        bcrypt_cost: 4,
        login_max_failures: MAX_FAILURES,
        login_failure_window_secs: 300,
        orphan_sweep_interval_secs: 0,
        orphan_grace_period_secs: 0,
    })
}

/// Test application: server plus the stores behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: MemoryStore,
    pub storage: Arc<LocalStorage>,
    pub _temp_dir: TempDir,
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("temp dir");
    let storage_path = temp_dir.path().to_string_lossy().to_string();
    let config = test_config(&storage_path);

    let storage = Arc::new(
        LocalStorage::new(
            temp_dir.path(),
            PUBLIC_BASE_URL.to_string(),
            UrlSigner::new(JWT_SECRET),
        )
        .await
        .expect("local storage"),
    );
    let store = MemoryStore::new();

    let state = services::build_state(
        &config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        storage.clone(),
        None,
    );
    let router = routes::setup_routes(&config, state.clone()).expect("routes");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        state,
        store,
        storage,
        _temp_dir: temp_dir,
    }
}

pub fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

impl TestApp {
    pub async fn admin_token(&self) -> String {
        let response = self
            .server
            .post(&api_path("/admin/login"))
            .json(&json!({ "username": OPERATOR, "password": OPERATOR_PASSWORD }))
            .await;
        response.assert_status_ok();
        response.json::<serde_json::Value>()["token"]
            .as_str()
            .expect("admin token")
            .to_string()
    }

    pub async fn create_company(&self, username: &str, company_name: &str, password: &str) -> CompanyResponse {
        let token = self.admin_token().await;
        let response = self
            .server
            .post(&api_path("/admin/companies"))
            .authorization_bearer(token)
            .json(&json!({
                "username": username,
                "company_name": company_name,
                "password": password,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<CompanyResponse>()
    }

    pub async fn login(&self, username: &str, password: &str) -> LoginResponse {
        let response = self
            .server
            .post(&api_path("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<LoginResponse>()
    }

    /// Create a company and log it in; returns its session token.
    pub async fn company_session(&self, username: &str) -> String {
        self.create_company(username, &format!("{} Ltd", username), "secret-pass")
            .await;
        self.login(username, "secret-pass").await.token
    }

    pub async fn checklist(&self, token: &str) -> ChecklistResponse {
        let response = self
            .server
            .get(&api_path("/checklist"))
            .authorization_bearer(token)
            .await;
        response.assert_status_ok();
        response.json::<ChecklistResponse>()
    }

    pub async fn upload(
        &self,
        token: &str,
        doc_type: &str,
        file_name: &str,
        data: &[u8],
    ) -> axum_test::TestResponse {
        let form = MultipartForm::new().add_text("doc_type", doc_type).add_part(
            "file",
            Part::bytes(data.to_vec())
                .file_name(file_name)
                .mime_type("application/pdf"),
        );
        self.server
            .post(&api_path("/documents"))
            .authorization_bearer(token)
            .multipart(form)
            .await
    }

    pub async fn upload_ok(&self, token: &str, doc_type: &str, file_name: &str) -> ChecklistEntry {
        let response = self.upload(token, doc_type, file_name, b"%PDF-1.4 test").await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<ChecklistEntry>()
    }
}
