//! Request logging middleware for tracing and monitoring

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, info, warn};

/// Header carrying the request id in both directions
pub static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Log every request in a span carrying its id, and echo the id back
pub async fn request_logging(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(generate_request_id, String::from);

    let span = tracing::info_span!(
        "request",
        method = %method,
        uri = %uri,
        request_id = %request_id,
    );

    let mut response = async move {
        let response = next.run(request).await;
        let elapsed = start_time.elapsed();
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            warn!(status = %status, elapsed = ?elapsed, "Request completed with error");
        } else {
            info!(status = %status, elapsed = ?elapsed, "Request completed");
        }

        response
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID.clone(), value);
    }
    response
}

fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
