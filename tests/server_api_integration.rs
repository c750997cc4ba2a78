//! Integration tests for the HTTP surface: upload validation and cleanup,
//! worker failure translation, and the mindmap store endpoints, driven
//! through the real router with an in-memory store and scripted extractors.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};
use server::error::{ServerError, ServerResult};
use server::store::MemoryStore;
use server::worker::PdfExtractor;
use server::{build_router, ServerConfig, ServerState};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Extractor that returns a fixed result and records whether the staged file
/// existed when it ran.
struct ScriptedExtractor {
    output: Value,
    saw_staged_file: Arc<AtomicBool>,
}

#[async_trait]
impl PdfExtractor for ScriptedExtractor {
    async fn run(&self, path: &Path) -> ServerResult<Value> {
        self.saw_staged_file.store(path.exists(), Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Extractor that always fails the way a crashing worker does.
struct FailingExtractor {
    details: String,
}

#[async_trait]
impl PdfExtractor for FailingExtractor {
    async fn run(&self, _path: &Path) -> ServerResult<Value> {
        Err(ServerError::Worker {
            details: self.details.clone(),
        })
    }
}

fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        store_backend: "memory".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        metrics_enabled: false,
        ..Default::default()
    }
}

fn test_app(config: ServerConfig, extractor: Arc<dyn PdfExtractor>) -> Router {
    let state = ServerState::with_components(config, Arc::new(MemoryStore::new()), extractor);
    build_router(Arc::new(state)).expect("router builds")
}

fn multipart_upload(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn staged_file_count(upload_dir: &Path) -> usize {
    match std::fs::read_dir(upload_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn test_health_shape() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: String::new(),
        }),
    );

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "Server is running"}));
}

#[tokio::test]
async fn test_upload_success_returns_worker_output_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let saw_staged_file = Arc::new(AtomicBool::new(false));
    let app = test_app(
        test_config(dir.path()),
        Arc::new(ScriptedExtractor {
            output: json!({"pages": 3}),
            saw_staged_file: saw_staged_file.clone(),
        }),
    );

    let pdf = vec![b'%'; 2048];
    let response = app
        .oneshot(multipart_upload("pdf", "sample.pdf", "application/pdf", &pdf))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "status": "success",
            "data": {"pages": 3},
            "filename": "sample.pdf",
        })
    );
    assert!(saw_staged_file.load(Ordering::SeqCst));
    assert_eq!(staged_file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_upload_rejects_non_pdf_content_type_without_staging() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(ScriptedExtractor {
            output: json!({}),
            saw_staged_file: Arc::new(AtomicBool::new(false)),
        }),
    );

    let response = app
        .oneshot(multipart_upload("pdf", "notes.txt", "text/plain", b"hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Only PDF files are allowed");
    assert_eq!(staged_file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_upload_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(ScriptedExtractor {
            output: json!({}),
            saw_staged_file: Arc::new(AtomicBool::new(false)),
        }),
    );

    // A multipart request whose only field is not `pdf`.
    let response = app
        .oneshot(multipart_upload("attachment", "sample.pdf", "application/pdf", b"%PDF-"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "No file uploaded");
    assert_eq!(staged_file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_upload_rejects_oversize_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        max_upload_size_mb: 1,
        ..test_config(dir.path())
    };
    let app = test_app(
        config,
        Arc::new(ScriptedExtractor {
            output: json!({}),
            saw_staged_file: Arc::new(AtomicBool::new(false)),
        }),
    );

    let oversized = vec![0u8; 1024 * 1024 + 1];
    let response = app
        .oneshot(multipart_upload("pdf", "big.pdf", "application/pdf", &oversized))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], "error");
    assert_eq!(staged_file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_upload_worker_failure_returns_500_with_stderr_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: "Traceback: cannot open PDF".to_string(),
        }),
    );

    let response = app
        .oneshot(multipart_upload("pdf", "bad.pdf", "application/pdf", b"%PDF-"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({
            "status": "error",
            "message": "Failed to process PDF",
            "details": "Traceback: cannot open PDF",
        })
    );
    assert_eq!(staged_file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_upload_raw_text_result_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(ScriptedExtractor {
            output: json!({"text": "page one\npage two"}),
            saw_staged_file: Arc::new(AtomicBool::new(false)),
        }),
    );

    let response = app
        .oneshot(multipart_upload("pdf", "scan.pdf", "application/pdf", b"%PDF-"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], json!({"text": "page one\npage two"}));
}

#[tokio::test]
async fn test_save_then_fetch_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: String::new(),
        }),
    );

    let mindmap = json!({"title": "roots", "nodes": [{"id": 1, "label": "trunk"}]});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/save", mindmap.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let saved = body_json(response).await;
    assert_eq!(saved["status"], "success");
    let document = &saved["data"];
    assert_eq!(document["title"], "roots");
    assert_eq!(document["nodes"], mindmap["nodes"]);

    let id = document["_id"].as_str().expect("_id is a string");
    let response = app
        .oneshot(get(&format!("/mindmap/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = body_json(response).await;
    assert_eq!(fetched["data"], *document);
}

#[tokio::test]
async fn test_list_mindmaps_returns_every_document() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: String::new(),
        }),
    );

    for i in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/save", json!({"n": i})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/mindmaps")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_unknown_id_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: String::new(),
        }),
    );

    let absent = ObjectId::new().to_hex();
    let response = app
        .oneshot(get(&format!("/mindmap/{absent}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_fetch_malformed_id_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: String::new(),
        }),
    );

    let response = app.oneshot(get("/mindmap/not-a-valid-id")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Invalid document id"),
        "message = {}",
        body["message"]
    );
}

#[tokio::test]
async fn test_save_rejects_non_object_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: String::new(),
        }),
    );

    let response = app
        .oneshot(json_request("POST", "/save", json!([1, 2, 3])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_unknown_route_is_normalized_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        test_config(dir.path()),
        Arc::new(FailingExtractor {
            details: String::new(),
        }),
    );

    let response = app.oneshot(get("/no-such-route")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status"], "error");
}
