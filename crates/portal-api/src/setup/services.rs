//! Service and state construction

use crate::auth::{AuthFailureLimiter, SessionKeys};
use crate::state::AppState;
use crate::utils::upload::UploadLimits;
use portal_core::Config;
use portal_db::{CompanyStore, DocumentRecordStore};
use portal_services::{
    AccountService, ChecklistService, OperatorCredential, OrphanSweeper, PasswordHasher,
};
use portal_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Wire the services over the given stores.
///
/// `pool` is only used by the readiness probe; pass `None` for in-memory stores.
pub fn build_state(
    config: &Config,
    companies: Arc<dyn CompanyStore>,
    documents: Arc<dyn DocumentRecordStore>,
    storage: Arc<dyn Storage>,
    pool: Option<PgPool>,
) -> Arc<AppState> {
    let accounts = AccountService::new(
        companies,
        documents.clone(),
        storage.clone(),
        PasswordHasher::new(config.bcrypt_cost()),
        OperatorCredential {
            username: config.admin_username().to_string(),
            password_hash: config.admin_password_hash().to_string(),
        },
    );

    let checklist = ChecklistService::new(
        documents.clone(),
        storage.clone(),
        Duration::from_secs(config.signed_url_ttl_secs()),
    );

    let sweeper = Arc::new(OrphanSweeper::new(
        documents,
        storage.clone(),
        Duration::from_secs(config.orphan_grace_period_secs()),
        Duration::from_secs(config.orphan_sweep_interval_secs()),
    ));

    let sessions = SessionKeys::new(
        config.jwt_secret(),
        chrono::Duration::hours(config.session_ttl_hours()),
    );

    let login_limiter = Arc::new(AuthFailureLimiter::new(
        config.login_max_failures(),
        config.login_failure_window_secs(),
    ));

    tracing::info!(
        max_document_mb = config.max_document_size_bytes() / 1024 / 1024,
        extensions = %config.document_allowed_extensions().join(","),
        "Services initialized"
    );

    Arc::new(AppState {
        config: config.clone(),
        accounts,
        checklist,
        sweeper,
        storage,
        sessions,
        login_limiter,
        upload_limits: UploadLimits {
            max_file_size: config.max_document_size_bytes(),
            allowed_extensions: config.document_allowed_extensions().to_vec(),
        },
        db_pool: pool,
    })
}
