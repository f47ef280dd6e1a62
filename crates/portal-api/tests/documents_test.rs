//! Checklist and document integration tests.
//!
//! Run with: `cargo test -p portal-api --test documents_test`

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{api_path, setup_test_app, PUBLIC_BASE_URL};
use portal_core::models::{DocumentResponse, DocumentType, UploadStatus};
use portal_storage::Storage;
use serde_json::Value;

#[tokio::test]
async fn upload_marks_entry_received_and_survives_reload() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;

    let entry = app
        .upload_ok(&token, "ISO Certificate", "iso-27001.pdf")
        .await;

    assert_eq!(entry.doc_type, DocumentType::IsoCertificate);
    assert_eq!(entry.status, UploadStatus::Received);
    assert!(entry.record_id.is_some());
    let key = entry.file_name.clone().expect("storage key");
    assert!(key.starts_with("acme/"));
    assert!(key.ends_with("_iso-27001.pdf"));
    assert!(app.storage.exists(&key).await.unwrap());

    let checklist = app.checklist(&token).await;
    let iso = checklist
        .entries
        .iter()
        .find(|e| e.doc_type == DocumentType::IsoCertificate)
        .unwrap();
    assert_eq!(iso.status, UploadStatus::Received);
    assert_eq!(iso.record_id, entry.record_id);
    assert!(iso.download_url.is_some());
    let pending = checklist
        .entries
        .iter()
        .filter(|e| e.status == UploadStatus::NotReceived)
        .count();
    assert_eq!(pending, 9);
}

#[tokio::test]
async fn uploading_the_same_type_twice_keeps_one_record() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;

    let first = app.upload_ok(&token, "ISO Certificate", "old.pdf").await;
    let second = app.upload_ok(&token, "ISO Certificate", "new.pdf").await;

    let response = app
        .server
        .get(&api_path("/documents"))
        .authorization_bearer(token)
        .await;
    response.assert_status_ok();
    let documents = response.json::<Vec<DocumentResponse>>();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].original_name, "new.pdf");

    let old_key = first.file_name.unwrap();
    let new_key = second.file_name.unwrap();
    assert_ne!(old_key, new_key);
    assert!(!app.storage.exists(&old_key).await.unwrap());
    assert!(app.storage.exists(&new_key).await.unwrap());
}

#[tokio::test]
async fn every_type_uploaded_means_all_submitted() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;

    for (i, doc_type) in DocumentType::ALL.iter().enumerate() {
        app.upload_ok(&token, doc_type.as_str(), &format!("file-{}.pdf", i))
            .await;
    }

    let checklist = app.checklist(&token).await;
    assert!(checklist.all_submitted);
    assert!(checklist
        .entries
        .iter()
        .all(|e| e.status == UploadStatus::Received));
}

#[tokio::test]
async fn delete_by_record_id_clears_the_entry() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;
    let entry = app.upload_ok(&token, "HR Policy", "hr.pdf").await;
    let record_id = entry.record_id.unwrap();
    let key = entry.file_name.unwrap();

    app.server
        .delete(&api_path(&format!("/documents/{}", record_id)))
        .authorization_bearer(token.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert!(!app.storage.exists(&key).await.unwrap());
    let checklist = app.checklist(&token).await;
    let hr = checklist
        .entries
        .iter()
        .find(|e| e.doc_type == DocumentType::HrPolicy)
        .unwrap();
    assert_eq!(hr.status, UploadStatus::NotReceived);
    assert!(hr.record_id.is_none());

    // A second delete finds nothing.
    app.server
        .delete(&api_path(&format!("/documents/{}", record_id)))
        .authorization_bearer(token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn companies_cannot_delete_each_others_documents() {
    let app = setup_test_app().await;
    let acme = app.company_session("acme").await;
    let globex = app.company_session("globex").await;
    let entry = app.upload_ok(&acme, "Privacy Policy", "privacy.pdf").await;

    app.server
        .delete(&api_path(&format!("/documents/{}", entry.record_id.unwrap())))
        .authorization_bearer(globex)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let checklist = app.checklist(&acme).await;
    let privacy = checklist
        .entries
        .iter()
        .find(|e| e.doc_type == DocumentType::PrivacyPolicy)
        .unwrap();
    assert_eq!(privacy.status, UploadStatus::Received);
}

#[tokio::test]
async fn malformed_record_id_is_a_bad_request() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;

    app.server
        .delete(&api_path("/documents/not-a-uuid"))
        .authorization_bearer(token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_rejects_unknown_type_and_disallowed_extension() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;

    let response = app.upload(&token, "Tax Return", "tax.pdf", b"data").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .upload(&token, "HR Policy", "payload.exe", b"data")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app.upload(&token, "HR Policy", "empty.pdf", b"").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert!(app.storage.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_rejects_oversized_files() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;
    let too_big = vec![b'x'; app.state.upload_limits.max_file_size + 1];

    let response = app.upload(&token, "HR Policy", "big.pdf", &too_big).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.storage.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn signed_link_downloads_the_file() {
    let app = setup_test_app().await;
    let token = app.company_session("acme").await;
    app.upload_ok(&token, "Consent Forms", "consent.pdf").await;

    let checklist = app.checklist(&token).await;
    let url = checklist
        .entries
        .iter()
        .find(|e| e.doc_type == DocumentType::ConsentForms)
        .and_then(|e| e.download_url.clone())
        .expect("download url");
    let path = url.strip_prefix(PUBLIC_BASE_URL).expect("local link");

    let response = app.server.get(path).await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"%PDF-1.4 test");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"consent.pdf\""
    );
}

#[tokio::test]
async fn tampered_download_token_is_rejected() {
    let app = setup_test_app().await;

    let response = app.server.get("/files/bm90LWEtdG9rZW4.deadbeef").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid or expired download link"
    );
}
