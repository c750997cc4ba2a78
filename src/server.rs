//! Server initialization and routing
//!
//! Router assembly, middleware stack, tracing/metrics bootstrap, and
//! graceful shutdown.

use crate::config::ServerConfig;
use crate::middleware::track_requests;
use crate::routes::{api_info, health, mindmap, not_found, upload};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the axum router with all routes and middleware.
///
/// Only the configured front-end origin may call the API, GET/POST only.
/// The body limit sits a little above the upload ceiling so an oversize file
/// reaches the upload validator and surfaces as a 400 rather than a bare 413.
pub fn build_router(state: Arc<ServerState>) -> anyhow::Result<Router> {
    let origin: HeaderValue = state
        .config
        .cors_origin
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid cors_origin {:?}: {e}", state.config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let body_limit = DefaultBodyLimit::max(state.config.max_upload_size() + 1024 * 1024);

    Ok(Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/upload", post(upload::upload_pdf))
        .route("/save", post(mindmap::save_mindmap))
        .route("/mindmap/{id}", get(mindmap::get_mindmap))
        .route("/mindmaps", get(mindmap::list_mindmaps))
        .fallback(not_found)
        .layer(body_limit)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(cors)
        .layer(from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the mindmap HTTP server.
///
/// Blocks until shutdown via SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .json()
        .init();

    let mut state = ServerState::new(config.clone()).await?;

    if config.metrics_enabled {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => state.metrics = Some(handle),
            Err(err) => tracing::warn!(error = %err, "Failed to install metrics recorder"),
        }
    }

    let app = build_router(Arc::new(state))?;
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        addr = %addr,
        upload_dir = %config.upload_dir.display(),
        worker = %config.worker_runtime,
        script = %config.worker_script.display(),
        store = %config.store_backend,
        "Starting mindmap server"
    );
    tracing::info!(origin = %config.cors_origin, "Accepting cross-origin requests");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
