//! Application state shared by every handler.

use crate::auth::middleware::AuthState;
use crate::auth::{AuthFailureLimiter, SessionKeys};
use crate::utils::upload::UploadLimits;
use portal_core::Config;
use portal_services::{AccountService, ChecklistService, OrphanSweeper};
use portal_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub accounts: AccountService,
    pub checklist: ChecklistService,
    pub sweeper: Arc<OrphanSweeper>,
    pub storage: Arc<dyn Storage>,
    pub sessions: SessionKeys,
    pub login_limiter: Arc<AuthFailureLimiter>,
    pub upload_limits: UploadLimits,
    /// `None` when the stores are not backed by PostgreSQL (tests).
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            sessions: self.sessions.clone(),
            accounts: self.accounts.clone(),
        }
    }
}
