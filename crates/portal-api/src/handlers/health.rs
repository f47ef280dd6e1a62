use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness probe - always 200 while the process can respond
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" })))
}

/// Readiness probe - checks the database and the object store
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = serde_json::json!({
        "status": "ready",
        "database": "unknown",
        "storage": "unknown",
    });
    let mut overall_ready = true;

    match &state.db_pool {
        Some(pool) => {
            match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
                Ok(Ok(_)) => response["database"] = serde_json::json!("ready"),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Database readiness check failed");
                    response["database"] = serde_json::json!("not_ready");
                    overall_ready = false;
                }
                Err(_) => {
                    tracing::error!("Database readiness check timed out");
                    response["database"] = serde_json::json!("timeout");
                    overall_ready = false;
                }
            }
        }
        None => response["database"] = serde_json::json!("in_memory"),
    }

    // A lookup of a key that never exists proves connectivity without writing anything.
    match tokio::time::timeout(TIMEOUT, state.storage.exists("readiness-probe")).await {
        Ok(Ok(_)) => response["storage"] = serde_json::json!("ready"),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Storage readiness check failed");
            response["storage"] = serde_json::json!("not_ready");
            overall_ready = false;
        }
        Err(_) => {
            tracing::error!("Storage readiness check timed out");
            response["storage"] = serde_json::json!("timeout");
            overall_ready = false;
        }
    }

    let status_code = if overall_ready {
        StatusCode::OK
    } else {
        response["status"] = serde_json::json!("not_ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
