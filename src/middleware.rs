use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Request tracking middleware: attaches an id (propagated from the client
/// or generated) and logs start/completion with latency.
pub async fn track_requests(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    request.extensions_mut().insert(request_id.clone());

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let mut response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    if let Ok(value) = request_id.parse::<axum::http::HeaderValue>() {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}
