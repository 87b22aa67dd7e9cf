//! Health check endpoint

use crate::state::AppState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Timestamp of the check
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Backend the front end talks to
    pub backend: String,
    /// Seconds since the service started
    pub uptime_seconds: u64,
}

/// Liveness of the front end itself
///
/// The backend is not probed: a down backend shows up as 502s on the pages
/// that need it, not as an unhealthy front end.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        backend: state.client.base_url().to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}
