//! Orphan sweep: remove stored objects that no metadata record references.
//!
//! Storage is listed before the referenced keys are read, so an upload that finishes
//! between the two reads is seen as referenced. Objects younger than the grace period
//! are skipped because their metadata write may still be in flight.

use chrono::Utc;
use portal_core::models::SweepReport;
use portal_core::AppError;
use portal_db::DocumentRecordStore;
use portal_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct OrphanSweeper {
    documents: Arc<dyn DocumentRecordStore>,
    storage: Arc<dyn Storage>,
    grace_period: Duration,
    interval: Duration,
}

impl OrphanSweeper {
    pub fn new(
        documents: Arc<dyn DocumentRecordStore>,
        storage: Arc<dyn Storage>,
        grace_period: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            documents,
            storage,
            grace_period,
            interval,
        }
    }

    /// Run one pass over the whole store.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self) -> Result<SweepReport, AppError> {
        let objects = self.storage.list("").await?;
        let referenced = self.documents.referenced_keys().await?;

        let grace = chrono::Duration::from_std(self.grace_period)
            .map_err(|e| AppError::Internal(format!("Invalid grace period: {}", e)))?;
        let cutoff = Utc::now()
            .checked_sub_signed(grace)
            .ok_or_else(|| AppError::Internal("Grace period out of range".to_string()))?;

        let mut report = SweepReport {
            scanned: objects.len(),
            ..Default::default()
        };

        for object in objects {
            if referenced.contains(&object.key) {
                report.referenced += 1;
                continue;
            }
            if object.last_modified > cutoff {
                report.skipped_recent += 1;
                continue;
            }
            match self.storage.remove(std::slice::from_ref(&object.key)).await {
                Ok(()) => {
                    tracing::info!(key = %object.key, size = object.size, "Removed orphaned object");
                    report.removed.push(object.key);
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %object.key, "Failed to remove orphaned object");
                    report.failed.push(object.key);
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            removed = report.removed.len(),
            failed = report.failed.len(),
            skipped_recent = report.skipped_recent,
            "Orphan sweep finished"
        );
        Ok(report)
    }

    /// Start the periodic sweep. Returns `None` when the interval is zero.
    pub fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.interval.is_zero() {
            tracing::info!("Orphan sweep disabled");
            return None;
        }

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so startup isn't slowed down.
            interval.tick().await;

            loop {
                interval.tick().await;
                if let Err(e) = self.sweep().await {
                    tracing::error!(error = %e, "Orphan sweep failed");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::models::{DocumentType, DocumentUpsert, NewCompany};
    use portal_db::{CompanyStore, MemoryStore};
    use portal_storage::{LocalStorage, PutOptions, UrlSigner};

    async fn setup(grace: Duration) -> (OrphanSweeper, Arc<LocalStorage>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(
            LocalStorage::new(
                dir.path(),
                "http://localhost:4000".to_string(),
                UrlSigner::new("secret"),
            )
            .await
            .unwrap(),
        );
        let store = MemoryStore::new();
        store
            .create(NewCompany {
                username: "acme".to_string(),
                company_name: "Acme".to_string(),
                password_hash: "$2b$04$hash".to_string(),
            })
            .await
            .unwrap();
        store
            .upsert(DocumentUpsert {
                company_username: "acme".to_string(),
                doc_type: DocumentType::CompanyProfile,
                file_name: "acme/1_profile.pdf".to_string(),
            })
            .await
            .unwrap();

        for key in ["acme/1_profile.pdf", "acme/2_orphan.pdf"] {
            storage
                .put(key, b"data".to_vec(), "application/pdf", PutOptions::default())
                .await
                .unwrap();
        }

        let sweeper = OrphanSweeper::new(
            Arc::new(store),
            storage.clone(),
            grace,
            Duration::ZERO,
        );
        (sweeper, storage, dir)
    }

    #[tokio::test]
    async fn removes_unreferenced_objects_only() {
        let (sweeper, storage, _dir) = setup(Duration::ZERO).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let report = sweeper.sweep().await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.referenced, 1);
        assert_eq!(report.removed, vec!["acme/2_orphan.pdf".to_string()]);
        assert!(report.failed.is_empty());
        assert!(storage.exists("acme/1_profile.pdf").await.unwrap());
        assert!(!storage.exists("acme/2_orphan.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn recent_objects_are_left_alone() {
        let (sweeper, storage, _dir) = setup(Duration::from_secs(3600)).await;

        let report = sweeper.sweep().await.unwrap();

        assert_eq!(report.skipped_recent, 1);
        assert!(report.removed.is_empty());
        assert!(storage.exists("acme/2_orphan.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn out_of_range_grace_period_is_an_error() {
        let (sweeper, storage, _dir) = setup(Duration::from_secs(u64::MAX)).await;

        assert!(sweeper.sweep().await.is_err());
        assert!(storage.exists("acme/2_orphan.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn zero_interval_does_not_spawn() {
        let (sweeper, _storage, _dir) = setup(Duration::ZERO).await;
        assert!(Arc::new(sweeper).start().is_none());
    }
}
