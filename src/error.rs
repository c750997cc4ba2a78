use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("File exceeds {0}MB size limit")]
    PayloadTooLarge(usize),

    #[error("Failed to process PDF")]
    Worker { details: String },

    #[error("Invalid document id: {0}")]
    InvalidIdentifier(String),

    #[error("Not found")]
    NotFound,

    #[error("Document store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::PayloadTooLarge(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Worker { .. }
            | ServerError::InvalidIdentifier(_)
            | ServerError::Store(_)
            | ServerError::Config(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic payload for the `details` field, where one exists
    fn details(&self) -> Option<String> {
        match self {
            ServerError::Worker { details } => Some(details.clone()),
            ServerError::Store(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        let mut body = json!({
            "status": "error",
            "message": message,
        });
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
