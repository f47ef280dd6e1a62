use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Company login record as stored in the `companies` table.
///
/// Never serialized to clients: use [`CompanyResponse`] instead.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    pub id: Uuid,
    pub username: String,
    pub company_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public profile of a company account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub username: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            username: company.username,
            company_name: company.company_name,
            created_at: company.created_at,
        }
    }
}

/// Insert payload for a new company; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub username: String,
    pub company_name: String,
    pub password_hash: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CompanyChanges {
    pub username: Option<String>,
    pub company_name: Option<String>,
    pub password_hash: Option<String>,
}

impl CompanyChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.company_name.is_none() && self.password_hash.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[serde(default)]
    #[validate(length(max = 64))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub company_name: String,
    #[serde(default)]
    #[validate(length(max = 72))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub company_name: Option<String>,
    /// A new password; blank or absent keeps the current one.
    pub password: Option<String>,
}

/// Query string for the admin company listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompanySearchQuery {
    pub search: Option<String>,
}
