use crate::error::ServerResult;
use crate::state::ServerState;
use crate::upload;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Handle `POST /upload`: validate and stage the PDF, run the extraction
/// worker, and return its result.
///
/// The staged file is removed before the response is produced, on the
/// success and failure paths alike; `StagedUpload`'s destructor also covers
/// the paths that never reach the explicit removal (panics, abandoned
/// request futures).
pub async fn upload_pdf(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> ServerResult<impl IntoResponse> {
    let staged = upload::receive(&state.config, multipart).await?;
    metrics::counter!("pdf_uploads_total").increment(1);

    tracing::info!(
        filename = %staged.original_name,
        staged = %staged.staged_name,
        size = staged.size,
        "Processing uploaded PDF"
    );

    let start = Instant::now();
    let outcome = state.extractor.run(staged.path()).await;
    metrics::histogram!("pdf_worker_duration_seconds").record(start.elapsed().as_secs_f64());

    let filename = staged.original_name.clone();
    staged.remove();

    if outcome.is_err() {
        metrics::counter!("pdf_worker_failures_total").increment(1);
    }
    let data = outcome?;

    Ok(Json(json!({
        "status": "success",
        "data": data,
        "filename": filename,
    })))
}
