use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use axum::extract::Multipart;
use std::path::{Path, PathBuf};

/// The single accepted MIME type for uploads.
pub const PDF_MIME: &str = "application/pdf";

/// Multipart field name carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "pdf";

/// A validated upload staged on disk for the duration of processing.
///
/// Dropping the value deletes the staged file, so the file is reclaimed on
/// every exit path of the handler that owns it: success, worker failure, or
/// an abandoned request future. Deletion failures are logged, never surfaced.
#[derive(Debug)]
pub struct StagedUpload {
    /// Client-supplied filename
    pub original_name: String,
    /// Unique name under the staging directory
    pub staged_name: String,
    /// Declared MIME type
    pub content_type: String,
    /// Size in bytes
    pub size: u64,
    path: Option<PathBuf>,
}

impl StagedUpload {
    /// Absolute path of the staged file
    pub fn path(&self) -> &Path {
        self.path.as_deref().expect("staged file already removed")
    }

    /// Delete the staged file now instead of at drop time.
    pub fn remove(mut self) {
        self.remove_inner();
    }

    fn remove_inner(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %err, "Failed to delete staged upload");
            } else {
                tracing::debug!(path = %path.display(), "Deleted staged upload");
            }
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        self.remove_inner();
    }
}

/// Receive a multipart upload: validate the `pdf` field and stage it to disk.
///
/// Nothing is written until the field name, content type, and size have all
/// passed, so a rejected request leaves no file behind. Unknown fields are
/// drained and ignored.
pub async fn receive(config: &ServerConfig, mut multipart: Multipart) -> ServerResult<StagedUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Validation(format!("File upload error: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            // Drain and ignore unknown fields
            let _ = field.bytes().await;
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        if content_type != PDF_MIME {
            return Err(ServerError::Validation(
                "Only PDF files are allowed".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::Validation(format!("File upload error: {e}")))?;
        if data.len() > config.max_upload_size() {
            return Err(ServerError::PayloadTooLarge(config.max_upload_size_mb));
        }

        return stage(config, original_name, content_type, &data).await;
    }

    Err(ServerError::Validation("No file uploaded".to_string()))
}

/// Write validated upload bytes to the staging directory under a unique name.
async fn stage(
    config: &ServerConfig,
    original_name: String,
    content_type: String,
    data: &[u8],
) -> ServerResult<StagedUpload> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let staged_name = unique_name(&original_name);
    let path = config.upload_dir.join(&staged_name);
    tokio::fs::write(&path, data).await?;

    tracing::debug!(
        original = %original_name,
        staged = %path.display(),
        size = data.len(),
        "Staged upload"
    );

    Ok(StagedUpload {
        original_name,
        staged_name,
        content_type,
        size: data.len() as u64,
        path: Some(path),
    })
}

/// Derive a collision-resistant staged name from the client filename.
///
/// The original stem is kept (sanitized so client names cannot escape the
/// staging directory) with a millisecond timestamp and a random component
/// appended, so concurrent uploads of identically-named files never collide.
fn unique_name(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "{stem}-{}-{}.pdf",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}
