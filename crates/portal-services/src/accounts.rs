//! Company accounts: login and operator-side management.

use portal_core::constants::{ALL_FIELDS_REQUIRED_MESSAGE, INVALID_CREDENTIALS_MESSAGE};
use portal_core::models::{
    Company, CompanyChanges, CompanyResponse, CreateCompanyRequest, NewCompany,
    UpdateCompanyRequest,
};
use portal_core::AppError;
use portal_db::{CompanyStore, DocumentRecordStore};
use portal_storage::Storage;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::passwords::PasswordHasher;

/// The single operator allowed to manage accounts.
#[derive(Clone)]
pub struct OperatorCredential {
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone)]
pub struct AccountService {
    companies: Arc<dyn CompanyStore>,
    documents: Arc<dyn DocumentRecordStore>,
    storage: Arc<dyn Storage>,
    hasher: PasswordHasher,
    operator: OperatorCredential,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string())
}

/// Usernames double as storage prefixes, so keep them path-safe.
fn validate_username(username: &str) -> Result<(), AppError> {
    let valid = !username.starts_with('.')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ))
    }
}

impl AccountService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        documents: Arc<dyn DocumentRecordStore>,
        storage: Arc<dyn Storage>,
        hasher: PasswordHasher,
        operator: OperatorCredential,
    ) -> Self {
        Self {
            companies,
            documents,
            storage,
            hasher,
            operator,
        }
    }

    /// Check a company login.
    ///
    /// An unknown username and a wrong password fail identically.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate_company(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Company, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(invalid_credentials());
        }

        match self.companies.find_by_username(username).await? {
            Some(company) => {
                if self.hasher.verify(password, &company.password_hash).await? {
                    tracing::info!(company_id = %company.id, "Company login succeeded");
                    Ok(company)
                } else {
                    tracing::info!("Company login rejected");
                    Err(invalid_credentials())
                }
            }
            None => {
                self.hasher.burn_verification(password).await?;
                tracing::info!("Company login rejected");
                Err(invalid_credentials())
            }
        }
    }

    /// Check the operator login; returns the operator name.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate_operator(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, AppError> {
        let known = username.trim() == self.operator.username;
        let matches = self
            .hasher
            .verify(password, &self.operator.password_hash)
            .await?;
        if known && matches {
            tracing::info!("Operator login succeeded");
            Ok(self.operator.username.clone())
        } else {
            tracing::warn!("Operator login rejected");
            Err(invalid_credentials())
        }
    }

    pub async fn find_company(&self, id: Uuid) -> Result<Company, AppError> {
        self.companies
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
    }

    pub async fn list_companies(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<CompanyResponse>, AppError> {
        let companies = self.companies.list(search).await?;
        Ok(companies.into_iter().map(CompanyResponse::from).collect())
    }

    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_company(
        &self,
        request: CreateCompanyRequest,
    ) -> Result<CompanyResponse, AppError> {
        let username = request.username.trim();
        let company_name = request.company_name.trim();
        if username.is_empty() || company_name.is_empty() || request.password.is_empty() {
            return Err(AppError::InvalidInput(
                ALL_FIELDS_REQUIRED_MESSAGE.to_string(),
            ));
        }
        request.validate()?;
        validate_username(username)?;

        let password_hash = self.hasher.hash(&request.password).await?;
        let company = self
            .companies
            .create(NewCompany {
                username: username.to_string(),
                company_name: company_name.to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(company_id = %company.id, "Company created");
        Ok(company.into())
    }

    /// Update name and/or username; the password is rehashed only when a new one is given.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_company(
        &self,
        id: Uuid,
        request: UpdateCompanyRequest,
    ) -> Result<CompanyResponse, AppError> {
        request.validate()?;

        let username = request
            .username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        if let Some(ref username) = username {
            validate_username(username)?;
        }

        let password_hash = match request.password.as_deref() {
            Some(password) if !password.is_empty() => Some(self.hasher.hash(password).await?),
            _ => None,
        };

        let changes = CompanyChanges {
            username,
            company_name: request
                .company_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            password_hash,
        };
        if changes.is_empty() {
            return Err(AppError::BadRequest("No changes supplied".to_string()));
        }

        let company = self
            .companies
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

        tracing::info!(company_id = %company.id, "Company updated");
        Ok(company.into())
    }

    /// Delete the account. Its records go with it; its stored files are removed best effort
    /// and otherwise left for the orphan sweeper.
    #[tracing::instrument(skip(self))]
    pub async fn delete_company(&self, id: Uuid) -> Result<(), AppError> {
        let company = self.find_company(id).await?;
        let keys: Vec<String> = self
            .documents
            .list_for_company(&company.username)
            .await?
            .into_iter()
            .map(|d| d.file_name)
            .collect();

        if !self.companies.delete(id).await? {
            return Err(AppError::NotFound("Company not found".to_string()));
        }

        if !keys.is_empty() {
            if let Err(e) = self.storage.remove(&keys).await {
                tracing::warn!(
                    error = %e,
                    company_id = %id,
                    "Stored files of deleted company left for the orphan sweep"
                );
            }
        }

        tracing::info!(company_id = %id, files = keys.len(), "Company deleted");
        Ok(())
    }
}
