use crate::error::{ServerError, ServerResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Capability for turning a staged PDF into extracted data.
///
/// The HTTP layer only sees this seam, so the concrete subprocess mechanism
/// can be swapped for a fake in tests.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    /// Process the file at `path` and return the extraction result.
    async fn run(&self, path: &Path) -> ServerResult<Value>;
}

/// Extractor that invokes an external script as `<runtime> <script> <path>`.
///
/// The worker contract: write a JSON object (or arbitrary text) to stdout and
/// exit 0 on success, or write a diagnostic to stderr and exit non-zero.
pub struct ScriptWorker {
    runtime: String,
    script: PathBuf,
    timeout: Option<Duration>,
}

impl ScriptWorker {
    pub fn new(
        runtime: impl Into<String>,
        script: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            script: script.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PdfExtractor for ScriptWorker {
    async fn run(&self, path: &Path) -> ServerResult<Value> {
        let mut child = Command::new(&self.runtime)
            .arg(&self.script)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ServerError::Worker {
                details: format!("Failed to spawn {}: {err}", self.runtime),
            })?;

        // Drain both pipes concurrently so a worker that fills stderr while
        // stdout is unread cannot deadlock on a full pipe buffer.
        let collect = async {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let mut stdout_pipe = child.stdout.take().expect("stdout is piped");
            let mut stderr_pipe = child.stderr.take().expect("stderr is piped");
            let (out_res, err_res) = tokio::join!(
                stdout_pipe.read_to_end(&mut stdout),
                stderr_pipe.read_to_end(&mut stderr)
            );
            out_res?;
            err_res?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };

        let collected = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, collect).await;
                match waited {
                    Ok(res) => res,
                    Err(_) => {
                        tracing::warn!(
                            script = %self.script.display(),
                            timeout_secs = limit.as_secs(),
                            "Worker exceeded timeout, killing"
                        );
                        if let Err(err) = child.kill().await {
                            tracing::warn!(error = %err, "Failed to kill timed-out worker");
                        }
                        return Err(ServerError::Worker {
                            details: format!(
                                "PDF worker timed out after {}s",
                                limit.as_secs()
                            ),
                        });
                    }
                }
            }
            None => collect.await,
        };
        let (status, stdout, stderr) = collected?;

        if !status.success() {
            let stderr_text = String::from_utf8_lossy(&stderr).into_owned();
            tracing::warn!(
                script = %self.script.display(),
                code = status.code(),
                "Worker exited non-zero"
            );
            return Err(ServerError::Worker {
                details: if stderr_text.is_empty() {
                    "PDF processing failed".to_string()
                } else {
                    stderr_text
                },
            });
        }

        let stdout_text = String::from_utf8_lossy(&stdout).into_owned();
        // A worker may print plain text instead of JSON; that degrades to a
        // wrapped raw-text result, never to a failure.
        Ok(match serde_json::from_str::<Value>(&stdout_text) {
            Ok(value) => value,
            Err(_) => json!({ "text": stdout_text }),
        })
    }
}
