//! In-memory table store with the same constraints as the PostgreSQL schema.
//!
//! Unique usernames, one record per (company, doc_type) and the cascading foreign key
//! are all enforced, so tests exercise the same rules production does.

use async_trait::async_trait;
use chrono::Utc;
use portal_core::models::{Company, CompanyChanges, DocumentUpsert, NewCompany, UploadedDocument};
use portal_core::AppError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::company::CompanyStore;
use super::document::{DocumentRecordStore, UpsertOutcome};

#[derive(Default)]
struct Tables {
    companies: Vec<Company>,
    documents: Vec<UploadedDocument>,
}

/// Both stores over one shared set of tables. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_document_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent document upsert and delete fail with a database error.
    pub fn fail_document_writes(&self, fail: bool) {
        self.fail_document_writes.store(fail, Ordering::SeqCst);
    }

    fn check_document_write(&self) -> Result<(), AppError> {
        if self.fail_document_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn matches_search(company: &Company, needle: &str) -> bool {
    company.username.to_lowercase().contains(needle)
        || company.company_name.to_lowercase().contains(needle)
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn create(&self, company: NewCompany) -> Result<Company, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.companies.iter().any(|c| c.username == company.username) {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        let row = Company {
            id: Uuid::new_v4(),
            username: company.username,
            company_name: company.company_name,
            password_hash: company.password_hash,
            created_at: Utc::now(),
        };
        tables.companies.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Company>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .companies
            .iter()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Company>, AppError> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let tables = self.tables.lock().await;
        let mut rows: Vec<Company> = tables
            .companies
            .iter()
            .filter(|c| needle.as_deref().map_or(true, |n| matches_search(c, n)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.company_name
                .to_lowercase()
                .cmp(&b.company_name.to_lowercase())
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(rows)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: CompanyChanges,
    ) -> Result<Option<Company>, AppError> {
        let mut tables = self.tables.lock().await;
        if let Some(ref username) = changes.username {
            if tables
                .companies
                .iter()
                .any(|c| c.id != id && &c.username == username)
            {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }

        let Some(company) = tables.companies.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        let old_username = company.username.clone();
        if let Some(username) = changes.username {
            company.username = username;
        }
        if let Some(company_name) = changes.company_name {
            company.company_name = company_name;
        }
        if let Some(password_hash) = changes.password_hash {
            company.password_hash = password_hash;
        }
        let updated = company.clone();

        // ON UPDATE CASCADE
        for doc in tables
            .documents
            .iter_mut()
            .filter(|d| d.company_username == old_username)
        {
            doc.company_username = updated.username.clone();
        }

        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(position) = tables.companies.iter().position(|c| c.id == id) else {
            return Ok(false);
        };
        let removed = tables.companies.remove(position);
        // ON DELETE CASCADE
        tables
            .documents
            .retain(|d| d.company_username != removed.username);
        Ok(true)
    }
}

#[async_trait]
impl DocumentRecordStore for MemoryStore {
    async fn list_for_company(
        &self,
        company_username: &str,
    ) -> Result<Vec<UploadedDocument>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<UploadedDocument> = tables
            .documents
            .iter()
            .filter(|d| d.company_username == company_username)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(rows)
    }

    async fn find_for_company(
        &self,
        company_username: &str,
        id: Uuid,
    ) -> Result<Option<UploadedDocument>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .documents
            .iter()
            .find(|d| d.id == id && d.company_username == company_username)
            .cloned())
    }

    async fn upsert(&self, upsert: DocumentUpsert) -> Result<UpsertOutcome, AppError> {
        self.check_document_write()?;
        let mut tables = self.tables.lock().await;
        if !tables
            .companies
            .iter()
            .any(|c| c.username == upsert.company_username)
        {
            return Err(AppError::NotFound("Company not found".to_string()));
        }

        let doc_type = upsert.doc_type.as_str();
        let existing = tables
            .documents
            .iter_mut()
            .find(|d| d.company_username == upsert.company_username && d.doc_type == doc_type);

        match existing {
            Some(row) => {
                let replaced = row.clone();
                row.file_name = upsert.file_name;
                row.uploaded_at = Utc::now();
                Ok(UpsertOutcome {
                    record: row.clone(),
                    replaced: Some(replaced),
                })
            }
            None => {
                let record = UploadedDocument {
                    id: Uuid::new_v4(),
                    company_username: upsert.company_username,
                    doc_type: doc_type.to_string(),
                    file_name: upsert.file_name,
                    uploaded_at: Utc::now(),
                };
                tables.documents.push(record.clone());
                Ok(UpsertOutcome {
                    record,
                    replaced: None,
                })
            }
        }
    }

    async fn delete_for_company(
        &self,
        company_username: &str,
        id: Uuid,
    ) -> Result<bool, AppError> {
        self.check_document_write()?;
        let mut tables = self.tables.lock().await;
        let before = tables.documents.len();
        tables
            .documents
            .retain(|d| !(d.id == id && d.company_username == company_username));
        Ok(tables.documents.len() < before)
    }

    async fn referenced_keys(&self) -> Result<HashSet<String>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.documents.iter().map(|d| d.file_name.clone()).collect())
    }
}
