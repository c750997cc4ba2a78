//! API route handlers
//!
//! - `health`: liveness, readiness, and metrics
//! - `upload`: PDF upload and extraction
//! - `mindmap`: mindmap document persistence

pub mod health;
pub mod mindmap;
pub mod upload;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info, served at `GET /`.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Mindmap Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/upload",
            "/save",
            "/mindmap/{id}",
            "/mindmaps",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 handler for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
