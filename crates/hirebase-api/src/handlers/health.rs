//! Health check handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::constants::{API_VERSION, READINESS_TIMEOUT_SECS};
use crate::state::AppState;

/// Liveness check: the process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive", "api_version": API_VERSION })),
    )
}

/// Readiness check: the tenant registry is reachable.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Registry reachable"),
        (status = 503, description = "Registry unreachable")
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timeout = Duration::from_secs(READINESS_TIMEOUT_SECS);

    let (ready, registry) = match tokio::time::timeout(timeout, state.registry.ping()).await {
        Ok(Ok(())) => (true, "ready".to_string()),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Registry readiness check failed");
            (false, format!("not_ready: {}", e))
        }
        Err(_) => {
            tracing::error!("Registry readiness check timed out");
            (false, "timeout".to_string())
        }
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "registry": registry,
            "cached_tenant_pools": state.router.len().await,
        })),
    )
}
