//! Document checklist view-model.
//!
//! The checklist is rebuilt from remote records on every load: remote state always
//! overwrites local state. Between loads the client may toggle entries and select
//! files locally; those changes never reach the server on their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{DocumentType, UploadedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UploadStatus {
    #[serde(rename = "received")]
    Received,
    #[serde(rename = "none")]
    NotReceived,
}

impl UploadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UploadStatus::Received => "Document received",
            UploadStatus::NotReceived => "No document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChecklistEntry {
    pub doc_type: DocumentType,
    pub checked: bool,
    pub status: UploadStatus,
    /// Storage key of the received file.
    pub file_name: Option<String>,
    /// Metadata record id; the only key used for deletion.
    pub record_id: Option<Uuid>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub download_url: Option<String>,
    /// Local file chosen for upload but not yet sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_file: Option<String>,
    /// Message from the last failed action on this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ChecklistEntry {
    fn empty(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            checked: false,
            status: UploadStatus::NotReceived,
            file_name: None,
            record_id: None,
            uploaded_at: None,
            download_url: None,
            pending_file: None,
            last_error: None,
        }
    }

    fn receive(&mut self, record: &UploadedDocument) {
        self.checked = true;
        self.status = UploadStatus::Received;
        self.file_name = Some(record.file_name.clone());
        self.record_id = Some(record.id);
        self.uploaded_at = Some(record.uploaded_at);
        self.download_url = None;
        self.pending_file = None;
        self.last_error = None;
    }

    pub fn is_received(&self) -> bool {
        self.status == UploadStatus::Received
    }
}

/// The ten-entry checklist for one company.
///
/// Always holds exactly one entry per document type, in checklist order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Checklist {
    entries: Vec<ChecklistEntry>,
}

impl<'de> Deserialize<'de> for Checklist {
    /// Stored entries are matched by type; missing types come back empty.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Stored {
            #[serde(default)]
            entries: Vec<ChecklistEntry>,
        }

        let stored = Stored::deserialize(deserializer)?;
        Ok(Self::from_entries(stored.entries))
    }
}

impl Default for Checklist {
    fn default() -> Self {
        Self::new()
    }
}

impl Checklist {
    /// All types unchecked with nothing received.
    pub fn new() -> Self {
        Self {
            entries: DocumentType::ALL
                .iter()
                .copied()
                .map(ChecklistEntry::empty)
                .collect(),
        }
    }

    /// Place entries by type over a fresh checklist; a later duplicate wins.
    pub fn from_entries(entries: impl IntoIterator<Item = ChecklistEntry>) -> Self {
        let mut checklist = Self::new();
        for entry in entries {
            let doc_type = entry.doc_type;
            *checklist.entry_mut(doc_type) = entry;
        }
        checklist
    }

    /// Merge remote records into a fresh checklist.
    ///
    /// Records whose `doc_type` is not one of the fixed types are ignored. Should two
    /// records share a type, the most recent upload wins.
    pub fn from_records(records: &[UploadedDocument]) -> Self {
        let mut checklist = Self::new();
        for record in records {
            let Some(doc_type) = record.document_type() else {
                continue;
            };
            let entry = checklist.entry_mut(doc_type);
            let newer = entry
                .uploaded_at
                .map(|current| record.uploaded_at >= current)
                .unwrap_or(true);
            if newer {
                entry.receive(record);
            }
        }
        checklist
    }

    pub fn entries(&self) -> &[ChecklistEntry] {
        &self.entries
    }

    pub fn entry(&self, doc_type: DocumentType) -> &ChecklistEntry {
        &self.entries[doc_type.index()]
    }

    pub fn entry_mut(&mut self, doc_type: DocumentType) -> &mut ChecklistEntry {
        &mut self.entries[doc_type.index()]
    }

    pub fn find_by_record(&self, record_id: Uuid) -> Option<&ChecklistEntry> {
        self.entries.iter().find(|e| e.record_id == Some(record_id))
    }

    /// Flip the checked flag. Unchecking discards a pending file selection.
    /// Returns the new flag.
    pub fn toggle(&mut self, doc_type: DocumentType) -> bool {
        let entry = self.entry_mut(doc_type);
        entry.checked = !entry.checked;
        if !entry.checked {
            entry.pending_file = None;
        }
        entry.checked
    }

    /// Remember a local file for upload; selecting a file checks the entry.
    pub fn select_file(&mut self, doc_type: DocumentType, path: impl Into<String>) {
        let entry = self.entry_mut(doc_type);
        entry.checked = true;
        entry.pending_file = Some(path.into());
        entry.last_error = None;
    }

    /// Record a successful upload.
    pub fn apply_upload(&mut self, record: &UploadedDocument) {
        if let Some(doc_type) = record.document_type() {
            self.entry_mut(doc_type).receive(record);
        }
    }

    /// Record a failed upload: the entry stays checked, the selection is dropped and
    /// whatever was received before is kept.
    pub fn apply_upload_failure(&mut self, doc_type: DocumentType, message: impl Into<String>) {
        let entry = self.entry_mut(doc_type);
        entry.checked = true;
        entry.pending_file = None;
        entry.last_error = Some(message.into());
    }

    /// Record a successful delete.
    pub fn apply_delete(&mut self, doc_type: DocumentType) {
        *self.entry_mut(doc_type) = ChecklistEntry::empty(doc_type);
    }

    pub fn received_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_received()).count()
    }

    /// True iff every document type has been received.
    pub fn all_submitted(&self) -> bool {
        self.received_count() == DocumentType::ALL.len()
    }
}

/// Checklist as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChecklistResponse {
    pub company_username: String,
    pub entries: Vec<ChecklistEntry>,
    pub all_submitted: bool,
}

impl ChecklistResponse {
    pub fn new(company_username: impl Into<String>, checklist: Checklist) -> Self {
        let all_submitted = checklist.all_submitted();
        Self {
            company_username: company_username.into(),
            entries: checklist.entries,
            all_submitted,
        }
    }

    /// Rebuild the view-model from a server response, dropping nothing.
    pub fn into_checklist(self) -> Checklist {
        Checklist::from_entries(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc_type: DocumentType, key: &str) -> UploadedDocument {
        UploadedDocument {
            id: Uuid::new_v4(),
            company_username: "acme".to_string(),
            doc_type: doc_type.as_str().to_string(),
            file_name: key.to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn empty_company_is_not_submitted() {
        let checklist = Checklist::from_records(&[]);
        assert_eq!(checklist.entries().len(), 10);
        assert!(checklist
            .entries()
            .iter()
            .all(|e| !e.checked && e.status == UploadStatus::NotReceived));
        assert!(!checklist.all_submitted());
    }

    #[test]
    fn all_ten_records_submit_the_checklist() {
        let records: Vec<_> = DocumentType::ALL
            .iter()
            .map(|t| record(*t, &format!("acme/1_{}.pdf", t.index())))
            .collect();
        let checklist = Checklist::from_records(&records);
        assert!(checklist.all_submitted());
        assert!(checklist.entries().iter().all(|e| e.checked));
    }

    #[test]
    fn merge_marks_matching_entry_received() {
        let iso = record(DocumentType::IsoCertificate, "acme/1_iso.pdf");
        let checklist = Checklist::from_records(std::slice::from_ref(&iso));
        let entry = checklist.entry(DocumentType::IsoCertificate);
        assert!(entry.checked);
        assert_eq!(entry.status, UploadStatus::Received);
        assert_eq!(entry.record_id, Some(iso.id));
        assert_eq!(entry.file_name.as_deref(), Some("acme/1_iso.pdf"));
        assert_eq!(checklist.received_count(), 1);
    }

    #[test]
    fn merge_ignores_unknown_types() {
        let mut stray = record(DocumentType::HrPolicy, "acme/1_x.pdf");
        stray.doc_type = "Tax Return".to_string();
        assert_eq!(Checklist::from_records(&[stray]).received_count(), 0);
    }

    #[test]
    fn toggle_off_clears_pending_selection_only() {
        let iso = record(DocumentType::IsoCertificate, "acme/1_iso.pdf");
        let mut checklist = Checklist::from_records(&[iso]);

        checklist.select_file(DocumentType::HrPolicy, "/tmp/hr.pdf");
        assert!(checklist.entry(DocumentType::HrPolicy).checked);
        assert!(!checklist.toggle(DocumentType::HrPolicy));
        assert_eq!(checklist.entry(DocumentType::HrPolicy).pending_file, None);

        // Unchecking a received entry does not forget the remote file.
        assert!(!checklist.toggle(DocumentType::IsoCertificate));
        assert!(checklist.entry(DocumentType::IsoCertificate).is_received());
    }

    #[test]
    fn upload_then_delete_follows_state_machine() {
        let mut checklist = Checklist::new();
        assert!(checklist.toggle(DocumentType::PrivacyPolicy));
        checklist.select_file(DocumentType::PrivacyPolicy, "privacy.pdf");

        let stored = record(DocumentType::PrivacyPolicy, "acme/5_privacy.pdf");
        checklist.apply_upload(&stored);
        let entry = checklist.entry(DocumentType::PrivacyPolicy);
        assert!(entry.checked && entry.is_received());
        assert_eq!(entry.pending_file, None);

        checklist.apply_delete(DocumentType::PrivacyPolicy);
        let entry = checklist.entry(DocumentType::PrivacyPolicy);
        assert!(!entry.checked);
        assert_eq!(entry.status, UploadStatus::NotReceived);
        assert_eq!(entry.record_id, None);
    }

    #[test]
    fn failed_upload_keeps_entry_checked_without_file() {
        let mut checklist = Checklist::new();
        checklist.select_file(DocumentType::ConsentForms, "consent.pdf");
        checklist.apply_upload_failure(DocumentType::ConsentForms, "Failed to access storage");
        let entry = checklist.entry(DocumentType::ConsentForms);
        assert!(entry.checked);
        assert!(!entry.is_received());
        assert_eq!(entry.pending_file, None);
        assert_eq!(entry.last_error.as_deref(), Some("Failed to access storage"));
    }

    #[test]
    fn short_or_reordered_stored_entries_are_rebuilt() {
        let mut checklist: Checklist = serde_json::from_str(r#"{"entries":[]}"#).unwrap();
        assert_eq!(checklist.entries().len(), 10);
        assert!(checklist.toggle(DocumentType::ALL[0]));

        let mut entries = Checklist::new().entries().to_vec();
        entries.reverse();
        entries.truncate(3);
        entries[0].checked = true;
        let json = serde_json::json!({ "entries": entries });
        let checklist: Checklist = serde_json::from_value(json).unwrap();

        let types: Vec<_> = checklist.entries().iter().map(|e| e.doc_type).collect();
        assert_eq!(types, DocumentType::ALL.to_vec());
        assert!(checklist.entry(DocumentType::ConsentForms).checked);
        assert!(!checklist.entry(DocumentType::CompanyProfile).checked);
    }

    #[test]
    fn response_round_trip_preserves_entries() {
        let iso = record(DocumentType::IsoCertificate, "acme/1_iso.pdf");
        let checklist = Checklist::from_records(&[iso]);
        let response = ChecklistResponse::new("acme", checklist.clone());
        assert!(!response.all_submitted);
        assert_eq!(response.into_checklist(), checklist);
    }
}
