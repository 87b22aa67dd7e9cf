//! Error responses for the web front end

use almacen_core::Error as CoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, warn};

/// Errors a handler can end with
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Anything the domain or the backend client reported
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed request
    #[error("{0}")]
    BadRequest(String),
}

/// Result type for handlers
pub type WebResult<T> = Result<T, WebError>;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: &'static str,
    /// Additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl WebError {
    /// Status, code and details for this error
    fn parts(&self) -> (StatusCode, &'static str, Option<Value>) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            Self::Core(err) => match err {
                CoreError::Validation { field, .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    Some(json!({ "field": field })),
                ),
                CoreError::NotFound { resource } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    Some(json!({ "resource": resource })),
                ),
                CoreError::Authentication(_) | CoreError::InvalidToken(_) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", None)
                }
                CoreError::Forbidden { ruta, capability } => (
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    Some(json!({ "ruta": ruta, "capability": capability })),
                ),
                CoreError::DuplicateSubmission { resource } => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_SUBMISSION",
                    Some(json!({ "resource": resource })),
                ),
                CoreError::Transport(_) => {
                    (StatusCode::BAD_GATEWAY, "BACKEND_UNAVAILABLE", None)
                }
                CoreError::Timeout { duration_ms } => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "BACKEND_TIMEOUT",
                    Some(json!({ "duration_ms": duration_ms })),
                ),
                CoreError::Http { status, .. } => {
                    let backend = Some(json!({ "backend_status": status }));
                    match StatusCode::from_u16(*status) {
                        Ok(code) if code.is_client_error() => (code, "BACKEND_REJECTED", backend),
                        _ => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", backend),
                    }
                }
                CoreError::Io(_)
                | CoreError::Configuration { .. }
                | CoreError::Serialization(_)
                | CoreError::Other(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None)
                }
            },
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, details) = self.parts();
        if status.is_server_error() {
            error!(code, error = %self, "Request failed");
        } else {
            warn!(code, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code,
            details,
        };
        (status, Json(body)).into_response()
    }
}
