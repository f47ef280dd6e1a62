//! Login, session and guard integration tests.
//!
//! Run with: `cargo test -p portal-api --test auth_test`

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{api_path, forwarded_for, setup_test_app, JWT_SECRET, MAX_FAILURES};
use portal_api::auth::SessionKeys;
use portal_db::CompanyStore;
use serde_json::{json, Value};

#[tokio::test]
async fn company_login_returns_session_and_profile() {
    let app = setup_test_app().await;
    app.create_company("acme", "Acme Corp", "s3cret").await;

    let session = app.login("acme", "s3cret").await;

    assert!(!session.token.is_empty());
    assert_eq!(session.company.username, "acme");
    assert_eq!(session.company.company_name, "Acme Corp");
    assert!(session.expires_at > chrono::Utc::now());

    let checklist = app.checklist(&session.token).await;
    assert_eq!(checklist.company_username, "acme");
    assert_eq!(checklist.entries.len(), 10);
    assert!(!checklist.all_submitted);
}

#[tokio::test]
async fn unknown_user_and_wrong_password_fail_identically() {
    let app = setup_test_app().await;
    app.create_company("acme", "Acme Corp", "s3cret").await;

    let wrong_password = app
        .server
        .post(&api_path("/auth/login"))
        .json(&json!({ "username": "acme", "password": "nope" }))
        .await;
    let unknown_user = app
        .server
        .post(&api_path("/auth/login"))
        .json(&json!({ "username": "ghost", "password": "nope" }))
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_user.assert_status(StatusCode::UNAUTHORIZED);
    let a = wrong_password.json::<Value>();
    let b = unknown_user.json::<Value>();
    assert_eq!(a, b);
    assert_eq!(a["error"], "Invalid username or password");
}

#[tokio::test]
async fn blank_credentials_are_rejected_like_bad_ones() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post(&api_path("/auth/login"))
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid username or password");
}

#[tokio::test]
async fn repeated_failures_are_throttled_per_address() {
    let app = setup_test_app().await;
    app.create_company("acme", "Acme Corp", "s3cret").await;
    let (name, attacker) = forwarded_for("203.0.113.7");

    for _ in 0..MAX_FAILURES {
        app.server
            .post(&api_path("/auth/login"))
            .add_header(name.clone(), attacker.clone())
            .json(&json!({ "username": "acme", "password": "wrong" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while blocked.
    let blocked = app
        .server
        .post(&api_path("/auth/login"))
        .add_header(name.clone(), attacker.clone())
        .json(&json!({ "username": "acme", "password": "s3cret" }))
        .await;
    blocked.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(blocked.headers().get(header::RETRY_AFTER).is_some());

    let (name, other) = forwarded_for("198.51.100.1");
    app.server
        .post(&api_path("/auth/login"))
        .add_header(name, other)
        .json(&json!({ "username": "acme", "password": "s3cret" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = setup_test_app().await;

    let response = app.server.get(&api_path("/checklist")).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .get(&api_path("/checklist"))
        .authorization_bearer("not-a-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid session token");
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let app = setup_test_app().await;
    app.create_company("acme", "Acme Corp", "s3cret").await;
    let company = app
        .store
        .find_by_username("acme")
        .await
        .unwrap()
        .expect("company exists");

    let expired = SessionKeys::new(JWT_SECRET, chrono::Duration::seconds(-120))
        .issue_company(&company)
        .unwrap();

    let response = app
        .server
        .get(&api_path("/checklist"))
        .authorization_bearer(expired.token)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Session expired");
}

#[tokio::test]
async fn company_session_cannot_reach_admin_routes() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;

    let response = app
        .server
        .get(&api_path("/admin/companies"))
        .authorization_bearer(token)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_session_cannot_use_company_routes() {
    let app = setup_test_app().await;
    let token = app.admin_token().await;

    let response = app
        .server
        .get(&api_path("/checklist"))
        .authorization_bearer(token)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_operator_password_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post(&api_path("/admin/login"))
        .json(&json!({ "username": "operator", "password": "guess" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_company_loses_access_immediately() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;
    let company = app.store.find_by_username("acme").await.unwrap().unwrap();

    let admin = app.admin_token().await;
    app.server
        .delete(&api_path(&format!("/admin/companies/{}", company.id)))
        .authorization_bearer(admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = app
        .server
        .get(&api_path("/checklist"))
        .authorization_bearer(token)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Account no longer exists");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = setup_test_app().await;

    let response = app.server.get("/live").await;

    response.assert_status_ok();
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn readiness_reports_storage() {
    let app = setup_test_app().await;

    let response = app.server.get("/ready").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["storage"], "ready");
    assert_eq!(body["database"], "in_memory");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app().await;

    let response = app.server.get("/api/openapi.json").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["paths"]["/api/v1/checklist"].is_object());
}
