use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

/// Handle `POST /save`: persist an arbitrary mindmap JSON object and return
/// it with its generated `_id`.
pub async fn save_mindmap(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(body) = body.map_err(|err| ServerError::Validation(format!("Invalid JSON: {err}")))?;
    let object = match body {
        Value::Object(map) => map,
        _ => {
            return Err(ServerError::Validation(
                "JSON body must be an object".to_string(),
            ))
        }
    };

    let document = state.store.insert(object).await?;
    metrics::counter!("mindmaps_saved_total").increment(1);
    tracing::info!(id = %document["_id"], "Saved mindmap");

    Ok(Json(json!({
        "status": "success",
        "data": document,
    })))
}

/// Handle `GET /mindmap/{id}`.
pub async fn get_mindmap(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let document = state.store.fetch(&id).await?;
    Ok(Json(json!({
        "status": "success",
        "data": document,
    })))
}

/// Handle `GET /mindmaps`: every stored document, no pagination.
pub async fn list_mindmaps(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let documents = state.store.list().await?;
    Ok(Json(json!({
        "status": "success",
        "data": documents,
    })))
}
