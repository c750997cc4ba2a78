//! Mindmap Server - HTTP gateway for PDF extraction and mindmap storage
//!
//! This crate provides a small HTTP gateway that:
//!
//! - accepts a single-PDF multipart upload, stages it to disk, hands it to an
//!   external extraction worker, and returns the worker's output
//! - persists and retrieves arbitrary mindmap JSON documents in a document
//!   store
//!
//! # Lifecycle guarantees
//!
//! - Uploads are validated (field, MIME type, size ceiling) before a byte is
//!   written; a rejected upload stages nothing.
//! - The staged file is deleted on every exit path of the upload request
//!   (worker success, non-zero exit, timeout, or an error anywhere in the
//!   handler) via the [`upload::StagedUpload`] RAII guard.
//! - Worker stdout that fails to parse as JSON degrades to a `{"text": ...}`
//!   result; it is never treated as a failure.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /upload` - multipart PDF upload (field `pdf`), returns extraction result
//! - `POST /save` - persist a mindmap JSON object
//! - `GET /mindmap/{id}` - fetch one mindmap by id
//! - `GET /mindmaps` - list all mindmaps
//! - `GET /health` - liveness
//! - `GET /ready` - readiness with uptime
//! - `GET /metrics` - Prometheus metrics (when enabled)

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;
pub mod upload;
pub mod worker;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
