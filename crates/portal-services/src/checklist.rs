//! Checklist synchronization: load, upload and delete documents for one company.
//!
//! Uploads write the storage object first and the metadata row second. When the row write
//! fails the object is removed again; deletes remove the row first so a reload can never
//! show a document whose row is gone. Anything left behind by a half-finished sequence is
//! collected by the [`OrphanSweeper`](crate::OrphanSweeper).

use chrono::Utc;
use portal_core::models::{
    Checklist, ChecklistEntry, ChecklistResponse, DocumentResponse, DocumentType,
    DocumentUpsert, UploadedDocument,
};
use portal_core::AppError;
use portal_db::DocumentRecordStore;
use portal_storage::keys::{document_key, original_name};
use portal_storage::{PutOptions, Storage};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A validated file ready to be stored.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    /// Sanitized file name.
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone)]
pub struct ChecklistService {
    documents: Arc<dyn DocumentRecordStore>,
    storage: Arc<dyn Storage>,
    signed_url_ttl: Duration,
}

impl ChecklistService {
    pub fn new(
        documents: Arc<dyn DocumentRecordStore>,
        storage: Arc<dyn Storage>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            documents,
            storage,
            signed_url_ttl,
        }
    }

    /// Signed link for a stored object; `None` (and a log line) if signing fails.
    async fn download_url(&self, key: &str) -> Option<String> {
        match self.storage.signed_url(key, self.signed_url_ttl).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to sign download URL");
                None
            }
        }
    }

    /// Rebuild the checklist from the company's records.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, company_username: &str) -> Result<ChecklistResponse, AppError> {
        let records = self.documents.list_for_company(company_username).await?;
        let mut checklist = Checklist::from_records(&records);

        for doc_type in DocumentType::ALL {
            let key = checklist.entry(doc_type).file_name.clone();
            if let Some(key) = key {
                checklist.entry_mut(doc_type).download_url = self.download_url(&key).await;
            }
        }

        tracing::debug!(
            received = checklist.received_count(),
            all_submitted = checklist.all_submitted(),
            "Checklist loaded"
        );
        Ok(ChecklistResponse::new(company_username, checklist))
    }

    /// Every stored document of the company, newest first, with download links.
    #[tracing::instrument(skip(self))]
    pub async fn list_documents(
        &self,
        company_username: &str,
    ) -> Result<Vec<DocumentResponse>, AppError> {
        let records = self.documents.list_for_company(company_username).await?;
        let mut documents = Vec::with_capacity(records.len());
        for record in records {
            let download_url = self.download_url(&record.file_name).await;
            documents.push(DocumentResponse {
                id: record.id,
                original_name: original_name(&record.file_name).to_string(),
                doc_type: record.doc_type,
                file_name: record.file_name,
                uploaded_at: record.uploaded_at,
                download_url,
            });
        }
        Ok(documents)
    }

    /// Store a file and point the company's record for `doc_type` at it.
    #[tracing::instrument(
        skip(self, file),
        fields(file_name = %file.file_name, size_bytes = file.data.len())
    )]
    pub async fn upload(
        &self,
        company_username: &str,
        doc_type: DocumentType,
        file: DocumentFile,
    ) -> Result<ChecklistEntry, AppError> {
        let key = document_key(
            company_username,
            &file.file_name,
            Utc::now().timestamp_millis(),
        );

        self.storage
            .put(&key, file.data, &file.content_type, PutOptions { overwrite: false })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "Document upload to storage failed");
                AppError::from(e)
            })?;

        let outcome = match self
            .documents
            .upsert(DocumentUpsert {
                company_username: company_username.to_string(),
                doc_type,
                file_name: key.clone(),
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Metadata write failed after upload");
                return Err(self.compensate_upload(&key, e).await);
            }
        };

        if let Some(old_key) = outcome.superseded_key() {
            if let Err(e) = self.storage.remove(&[old_key.to_string()]).await {
                tracing::warn!(
                    error = %e,
                    key = %old_key,
                    "Replaced document left for the orphan sweep"
                );
            }
        }

        tracing::info!(record_id = %outcome.record.id, key = %key, "Document received");

        let mut checklist = Checklist::new();
        checklist.apply_upload(&outcome.record);
        let mut entry = checklist.entry(doc_type).clone();
        entry.download_url = self.download_url(&key).await;
        Ok(entry)
    }

    /// Remove the object written by a failed upload.
    async fn compensate_upload(&self, key: &str, cause: AppError) -> AppError {
        match self.storage.remove(&[key.to_string()]).await {
            Ok(()) => {
                tracing::info!(key = %key, "Removed stored object of failed upload");
                cause
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    key = %key,
                    "Could not remove stored object of failed upload; left for the orphan sweep"
                );
                AppError::PartialFailure(format!(
                    "metadata write failed ({}) and object {} could not be removed ({})",
                    cause, key, e
                ))
            }
        }
    }

    /// Delete a document by record id. Only the owning company may delete it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(
        &self,
        company_username: &str,
        record_id: Uuid,
    ) -> Result<UploadedDocument, AppError> {
        let record = self
            .documents
            .find_for_company(company_username, record_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if !self
            .documents
            .delete_for_company(company_username, record_id)
            .await?
        {
            return Err(AppError::NotFound("Document not found".to_string()));
        }

        if let Err(e) = self.storage.remove(std::slice::from_ref(&record.file_name)).await {
            tracing::error!(
                error = %e,
                key = %record.file_name,
                "Record deleted but stored object remains; left for the orphan sweep"
            );
            return Err(AppError::PartialFailure(format!(
                "record {} deleted but object {} could not be removed ({})",
                record.id, record.file_name, e
            )));
        }

        tracing::info!(key = %record.file_name, "Document deleted");
        Ok(record)
    }
}
