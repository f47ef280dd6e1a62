//! Domain methods for the portal API client.
//!
//! Response types come from `portal_core::models` so the client and server agree on
//! the wire shapes.

use crate::{ApiClient, API_PREFIX};
use anyhow::{Context, Result};
use portal_core::models::{
    AdminLoginResponse, ChecklistEntry, ChecklistResponse, CompanyResponse,
    CreateCompanyRequest, DocumentResponse, DocumentType, LoginRequest, LoginResponse,
    SweepReport, UpdateCompanyRequest,
};
use std::path::Path;
use uuid::Uuid;

impl ApiClient {
    /// Log a company in.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post_json(&format!("{}/auth/login", API_PREFIX), &body)
            .await
    }

    /// Log the operator in.
    pub async fn admin_login(&self, username: &str, password: &str) -> Result<AdminLoginResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post_json(&format!("{}/admin/login", API_PREFIX), &body)
            .await
    }

    pub async fn checklist(&self) -> Result<ChecklistResponse> {
        self.get(&format!("{}/checklist", API_PREFIX), &[]).await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentResponse>> {
        self.get(&format!("{}/documents", API_PREFIX), &[]).await
    }

    /// Upload a local file as the document of `doc_type`.
    pub async fn upload_document(
        &self,
        doc_type: DocumentType,
        file_path: &Path,
    ) -> Result<ChecklistEntry> {
        if file_path
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(anyhow::anyhow!("Invalid input: {}", file_path.display()));
        }
        let data = read_file(file_path)?;

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        let form = reqwest::multipart::Form::new()
            .text("doc_type", doc_type.as_str())
            .part(
                "file",
                reqwest::multipart::Part::bytes(data).file_name(filename),
            );

        self.post_multipart(&format!("{}/documents", API_PREFIX), form)
            .await
    }

    /// Delete a document by its record id.
    pub async fn delete_document(&self, record_id: Uuid) -> Result<()> {
        self.delete(&format!("{}/documents/{}", API_PREFIX, record_id))
            .await
    }

    pub async fn list_companies(&self, search: Option<&str>) -> Result<Vec<CompanyResponse>> {
        let query: Vec<(&str, String)> = search
            .map(|s| vec![("search", s.to_string())])
            .unwrap_or_default();
        self.get(&format!("{}/admin/companies", API_PREFIX), &query)
            .await
    }

    pub async fn create_company(&self, request: &CreateCompanyRequest) -> Result<CompanyResponse> {
        self.post_json(&format!("{}/admin/companies", API_PREFIX), request)
            .await
    }

    pub async fn update_company(
        &self,
        id: Uuid,
        request: &UpdateCompanyRequest,
    ) -> Result<CompanyResponse> {
        self.put_json(&format!("{}/admin/companies/{}", API_PREFIX, id), request)
            .await
    }

    pub async fn delete_company(&self, id: Uuid) -> Result<()> {
        self.delete(&format!("{}/admin/companies/{}", API_PREFIX, id))
            .await
    }

    pub async fn company_documents(&self, id: Uuid) -> Result<Vec<DocumentResponse>> {
        self.get(
            &format!("{}/admin/companies/{}/documents", API_PREFIX, id),
            &[],
        )
        .await
    }

    pub async fn run_sweep(&self) -> Result<SweepReport> {
        self.post_empty(&format!("{}/admin/maintenance/sweep", API_PREFIX))
            .await
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}
