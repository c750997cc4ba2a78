use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Liveness endpoint. The response shape is part of the public contract and
/// is what the front-end polls for.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "Server is running" }))
}

/// Readiness endpoint with uptime and component view.
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let uptime = SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(Json(json!({
        "status": "ready",
        "service": "mindmap-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "components": {
            "api": "ready",
            "store": state.config.store_backend,
        }
    })))
}

/// Prometheus metrics endpoint. Returns 404 when the recorder was not
/// installed (metrics disabled in config).
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    match &state.metrics {
        Some(handle) => Ok(handle.render()),
        None => Err(ServerError::NotFound),
    }
}
