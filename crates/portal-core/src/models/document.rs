use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::DocumentType;

/// One row of `uploaded_documents`: which storage object holds a company's document.
///
/// `doc_type` stays a string so rows written with a retired type name still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadedDocument {
    pub id: Uuid,
    pub company_username: String,
    pub doc_type: String,
    /// Storage object key, e.g. `acme/1718000000000_iso.pdf`.
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedDocument {
    /// Exact match on the stored display name.
    pub fn document_type(&self) -> Option<DocumentType> {
        DocumentType::from_name(&self.doc_type)
    }
}

/// Insert-or-replace payload keyed by (company_username, doc_type).
#[derive(Debug, Clone)]
pub struct DocumentUpsert {
    pub company_username: String,
    pub doc_type: DocumentType,
    pub file_name: String,
}

/// A stored document as returned to clients, with a time-limited download link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub doc_type: String,
    pub file_name: String,
    /// File name as uploaded, without the storage prefix.
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub download_url: Option<String>,
}

/// Outcome of one orphan sweep over the storage bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SweepReport {
    pub scanned: usize,
    pub referenced: usize,
    pub skipped_recent: usize,
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(doc_type: &str) -> UploadedDocument {
        UploadedDocument {
            id: Uuid::new_v4(),
            company_username: "acme".to_string(),
            doc_type: doc_type.to_string(),
            file_name: "acme/1_iso.pdf".to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn stored_type_must_be_the_exact_name() {
        assert_eq!(
            row("ISO Certificate").document_type(),
            Some(DocumentType::IsoCertificate)
        );
        assert_eq!(row("iso certificate").document_type(), None);
        assert_eq!(row("2").document_type(), None);
        assert_eq!(row(" ISO Certificate").document_type(), None);
    }
}
