//! Company account repository: CRUD for the companies table.

use async_trait::async_trait;
use portal_core::models::{Company, CompanyChanges, NewCompany};
use portal_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::like_pattern;

/// Table-store operations on company accounts.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Insert a company. A taken username yields `AppError::Conflict`.
    async fn create(&self, company: NewCompany) -> Result<Company, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Company>, AppError>;

    /// All companies ordered by name, optionally filtered by a case-insensitive substring
    /// of the username or company name.
    async fn list(&self, search: Option<&str>) -> Result<Vec<Company>, AppError>;

    /// Apply `changes`; `None` when no company has this id.
    async fn update(&self, id: Uuid, changes: CompanyChanges)
        -> Result<Option<Company>, AppError>;

    /// Delete the company and, through the foreign key, its document records.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

fn username_conflict(err: sqlx::Error) -> AppError {
    let err = AppError::from(err);
    if err.is_unique_violation() {
        AppError::Conflict("Username already exists".to_string())
    } else {
        err
    }
}

/// PostgreSQL implementation of [`CompanyStore`].
#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyStore for PgCompanyRepository {
    #[tracing::instrument(skip(self, company), fields(db.table = "companies", username = %company.username))]
    async fn create(&self, company: NewCompany) -> Result<Company, AppError> {
        let row = sqlx::query_as::<Postgres, Company>(
            r#"
            INSERT INTO companies (username, company_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, company_name, password_hash, created_at
            "#,
        )
        .bind(&company.username)
        .bind(&company.company_name)
        .bind(&company.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(username_conflict)?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<Postgres, Company>(
            r#"
            SELECT id, username, company_name, password_hash, created_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies"))]
    async fn find_by_username(&self, username: &str) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<Postgres, Company>(
            r#"
            SELECT id, username, company_name, password_hash, created_at
            FROM companies
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies"))]
    async fn list(&self, search: Option<&str>) -> Result<Vec<Company>, AppError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<Postgres, Company>(
            r#"
            SELECT id, username, company_name, password_hash, created_at
            FROM companies
            WHERE $1::text IS NULL
               OR username ILIKE $1 ESCAPE '\'
               OR company_name ILIKE $1 ESCAPE '\'
            ORDER BY lower(company_name), username
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self, changes), fields(db.table = "companies"))]
    async fn update(
        &self,
        id: Uuid,
        changes: CompanyChanges,
    ) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<Postgres, Company>(
            r#"
            UPDATE companies
            SET username = COALESCE($2, username),
                company_name = COALESCE($3, company_name),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING id, username, company_name, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.company_name)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(username_conflict)?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies"))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
