use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Allowed CORS origin (the front-end client)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Directory where uploads are staged while the worker runs
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in MB
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: usize,

    /// Runtime used to invoke the extraction worker (e.g. `python3`)
    #[serde(default = "default_worker_runtime")]
    pub worker_runtime: String,

    /// Path to the extraction worker script
    #[serde(default = "default_worker_script")]
    pub worker_script: PathBuf,

    /// Worker execution ceiling in seconds; 0 disables the timeout
    #[serde(default = "default_worker_timeout_secs")]
    pub worker_timeout_secs: u64,

    /// Document store backend: "mongodb" or "memory"
    #[serde(default = "default_store_backend")]
    pub store_backend: String,

    /// MongoDB connection string
    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[serde(default = "default_mongodb_database")]
    pub mongodb_database: String,

    /// MongoDB collection holding mindmap documents
    #[serde(default = "default_mongodb_collection")]
    pub mongodb_collection: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            cors_origin: default_cors_origin(),
            upload_dir: default_upload_dir(),
            max_upload_size_mb: default_max_upload_size_mb(),
            worker_runtime: default_worker_runtime(),
            worker_script: default_worker_script(),
            worker_timeout_secs: default_worker_timeout_secs(),
            store_backend: default_store_backend(),
            mongodb_uri: default_mongodb_uri(),
            mongodb_database: default_mongodb_database(),
            mongodb_collection: default_mongodb_collection(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("MINDMAP_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;

        if config.store_backend != "mongodb" && config.store_backend != "memory" {
            anyhow::bail!(
                "store_backend must be \"mongodb\" or \"memory\", got {:?}",
                config.store_backend
            );
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max upload size in bytes
    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Worker execution ceiling, or None when the timeout is disabled
    pub fn worker_timeout(&self) -> Option<Duration> {
        if self.worker_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.worker_timeout_secs))
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_size_mb() -> usize {
    10
}

fn default_worker_runtime() -> String {
    "python3".to_string()
}

fn default_worker_script() -> PathBuf {
    PathBuf::from("scripts").join("pdf_processing.py")
}

fn default_worker_timeout_secs() -> u64 {
    120
}

fn default_store_backend() -> String {
    "mongodb".to_string()
}

fn default_mongodb_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongodb_database() -> String {
    "mindmap".to_string()
}

fn default_mongodb_collection() -> String {
    "mindmaps".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
