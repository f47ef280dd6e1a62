//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::middleware::{admin_auth_middleware, company_auth_middleware};
use crate::constants::{API_PREFIX, FILES_ROUTE, MULTIPART_OVERHEAD_BYTES};
use crate::handlers;
use crate::state::AppState;
use crate::utils::ip_extraction::client_ip_middleware;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use portal_core::Config;
use portal_infra::{request_id_middleware, security_headers_middleware, SecurityHeaders};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(state.auth_state());

    let company_routes = company_routes().layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        company_auth_middleware,
    ));
    let admin_routes = admin_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        admin_auth_middleware,
    ));

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    let body_limit = config.max_document_size_bytes() + MULTIPART_OVERHEAD_BYTES;
    tracing::info!(
        http_concurrency_limit,
        body_limit,
        "HTTP limits configured"
    );

    let app = public_routes()
        .merge(company_routes)
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            config.trusted_proxy_count(),
            client_ip_middleware,
        ))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        // The multipart extractor has its own 2 MB default; the tower-http limit replaces it.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            SecurityHeaders {
                hsts: config.is_production(),
            },
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no session required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/live", get(handlers::health::liveness_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            &format!("{}/auth/login", API_PREFIX),
            post(handlers::auth::login),
        )
        .route(
            &format!("{}/admin/login", API_PREFIX),
            post(handlers::auth::admin_login),
        )
        .route(FILES_ROUTE, get(handlers::files::download_file))
}

/// Routes for a logged-in company
fn company_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/checklist", API_PREFIX),
            get(handlers::checklist::get_checklist),
        )
        .route(
            &format!("{}/documents", API_PREFIX),
            get(handlers::documents::list_documents).post(handlers::documents::upload_document),
        )
        .route(
            &format!("{}/documents/{{id}}", API_PREFIX),
            delete(handlers::documents::delete_document),
        )
}

/// Operator routes
fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/admin/companies", API_PREFIX),
            get(handlers::admin::list_companies).post(handlers::admin::create_company),
        )
        .route(
            &format!("{}/admin/companies/{{id}}", API_PREFIX),
            put(handlers::admin::update_company).delete(handlers::admin::delete_company),
        )
        .route(
            &format!("{}/admin/companies/{{id}}/documents", API_PREFIX),
            get(handlers::admin::company_documents),
        )
        .route(
            &format!("{}/admin/maintenance/sweep", API_PREFIX),
            post(handlers::maintenance::run_sweep),
        )
}

/// Prune idle login-throttle entries once a minute.
pub fn spawn_limiter_cleanup(state: &Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let limiter = state.login_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.prune().await;
        }
    })
}
