//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded [`Config`] to a router, kept out of
//! `main.rs` so integration tests can build the same application over in-memory stores.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use portal_core::Config;
use portal_db::{PgCompanyRepository, PgDocumentRepository};
use portal_infra::{init_telemetry, LogFormat, DEFAULT_FILTER};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    init_telemetry(LogFormat::from_env(), DEFAULT_FILTER)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        storage_backend = %config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    crate::error::set_hide_error_details(config.is_production());

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let state = services::build_state(
        &config,
        Arc::new(PgCompanyRepository::new(pool.clone())),
        Arc::new(PgDocumentRepository::new(pool.clone())),
        storage,
        Some(pool),
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
