//! Uploaded-document repository: the uploaded_documents metadata table.

use async_trait::async_trait;
use portal_core::models::{DocumentUpsert, UploadedDocument};
use portal_core::AppError;
use sqlx::{PgPool, Postgres};
use std::collections::HashSet;
use uuid::Uuid;

/// Result of an upsert: the stored record and the row it replaced, if any.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub record: UploadedDocument,
    pub replaced: Option<UploadedDocument>,
}

impl UpsertOutcome {
    /// Storage key that no record points at any more after this upsert.
    pub fn superseded_key(&self) -> Option<&str> {
        self.replaced
            .as_ref()
            .map(|old| old.file_name.as_str())
            .filter(|old| *old != self.record.file_name)
    }
}

/// Table-store operations on uploaded-document records.
///
/// At most one record exists per (company_username, doc_type).
#[async_trait]
pub trait DocumentRecordStore: Send + Sync {
    async fn list_for_company(
        &self,
        company_username: &str,
    ) -> Result<Vec<UploadedDocument>, AppError>;

    /// A record by id, only if it belongs to `company_username`.
    async fn find_for_company(
        &self,
        company_username: &str,
        id: Uuid,
    ) -> Result<Option<UploadedDocument>, AppError>;

    /// Insert, or replace the file of the existing record for the same company and type.
    /// The replaced row is reported even when a concurrent upload inserted it first.
    async fn upsert(&self, upsert: DocumentUpsert) -> Result<UpsertOutcome, AppError>;

    /// Delete a record by id, only if it belongs to `company_username`.
    async fn delete_for_company(&self, company_username: &str, id: Uuid)
        -> Result<bool, AppError>;

    /// Every storage key currently referenced by a record.
    async fn referenced_keys(&self) -> Result<HashSet<String>, AppError>;
}

/// PostgreSQL implementation of [`DocumentRecordStore`].
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRecordStore for PgDocumentRepository {
    #[tracing::instrument(skip(self), fields(db.table = "uploaded_documents"))]
    async fn list_for_company(
        &self,
        company_username: &str,
    ) -> Result<Vec<UploadedDocument>, AppError> {
        let rows = sqlx::query_as::<Postgres, UploadedDocument>(
            r#"
            SELECT id, company_username, doc_type, file_name, uploaded_at
            FROM uploaded_documents
            WHERE company_username = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(company_username)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_documents"))]
    async fn find_for_company(
        &self,
        company_username: &str,
        id: Uuid,
    ) -> Result<Option<UploadedDocument>, AppError> {
        let row = sqlx::query_as::<Postgres, UploadedDocument>(
            r#"
            SELECT id, company_username, doc_type, file_name, uploaded_at
            FROM uploaded_documents
            WHERE id = $1 AND company_username = $2
            "#,
        )
        .bind(id)
        .bind(company_username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(
        skip(self, upsert),
        fields(
            db.table = "uploaded_documents",
            company = %upsert.company_username,
            doc_type = %upsert.doc_type
        )
    )]
    async fn upsert(&self, upsert: DocumentUpsert) -> Result<UpsertOutcome, AppError> {
        // Two passes at most: a concurrent first upload can win the insert, after
        // which its row exists and is locked like any other.
        for _ in 0..2 {
            let mut tx = self.pool.begin().await?;

            let existing = sqlx::query_as::<Postgres, UploadedDocument>(
                r#"
                SELECT id, company_username, doc_type, file_name, uploaded_at
                FROM uploaded_documents
                WHERE company_username = $1 AND doc_type = $2
                FOR UPDATE
                "#,
            )
            .bind(&upsert.company_username)
            .bind(upsert.doc_type.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(replaced) = existing {
                let record = sqlx::query_as::<Postgres, UploadedDocument>(
                    r#"
                    UPDATE uploaded_documents
                    SET file_name = $2, uploaded_at = NOW()
                    WHERE id = $1
                    RETURNING id, company_username, doc_type, file_name, uploaded_at
                    "#,
                )
                .bind(replaced.id)
                .bind(&upsert.file_name)
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;
                return Ok(UpsertOutcome {
                    record,
                    replaced: Some(replaced),
                });
            }

            let inserted = sqlx::query_as::<Postgres, UploadedDocument>(
                r#"
                INSERT INTO uploaded_documents (company_username, doc_type, file_name, uploaded_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (company_username, doc_type) DO NOTHING
                RETURNING id, company_username, doc_type, file_name, uploaded_at
                "#,
            )
            .bind(&upsert.company_username)
            .bind(upsert.doc_type.as_str())
            .bind(&upsert.file_name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                let is_fk = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation()
                );
                if is_fk {
                    AppError::NotFound("Company not found".to_string())
                } else {
                    AppError::from(e)
                }
            })?;

            if let Some(record) = inserted {
                tx.commit().await?;
                return Ok(UpsertOutcome {
                    record,
                    replaced: None,
                });
            }

            tracing::debug!("Concurrent insert won; retrying as an update");
            tx.rollback().await?;
        }

        Err(AppError::Conflict(format!(
            "Document {} is being updated concurrently",
            upsert.doc_type
        )))
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_documents"))]
    async fn delete_for_company(
        &self,
        company_username: &str,
        id: Uuid,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM uploaded_documents WHERE id = $1 AND company_username = $2")
                .bind(id)
                .bind(company_username)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_documents"))]
    async fn referenced_keys(&self) -> Result<HashSet<String>, AppError> {
        let keys: Vec<String> = sqlx::query_scalar::<Postgres, String>(
            "SELECT file_name FROM uploaded_documents",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(keys.into_iter().collect())
    }
}
