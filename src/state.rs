use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::store::{self, DocumentStore};
use crate::worker::{PdfExtractor, ScriptWorker};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Mindmap document store (shared across requests)
    pub store: Arc<dyn DocumentStore>,

    /// PDF extraction worker
    pub extractor: Arc<dyn PdfExtractor>,

    /// Prometheus render handle, present when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create server state with the configured store backend and worker.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = store::from_config(&config).await?;
        let extractor = Arc::new(ScriptWorker::new(
            config.worker_runtime.clone(),
            config.worker_script.clone(),
            config.worker_timeout(),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            extractor,
            metrics: None,
        })
    }

    /// Create state around explicit components; used by tests to substitute
    /// a fake extractor or an in-memory store.
    pub fn with_components(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn PdfExtractor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            extractor,
            metrics: None,
        }
    }
}
