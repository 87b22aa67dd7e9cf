//! Web server setup and configuration

use crate::{middleware::logging::request_logging, routes::build_routes, state::AppState};
use almacen_core::{
    Config,
    context_error::{Result, ResultExt},
    context_error,
};
use axum::{Router, middleware};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};
use tracing::info;

/// Build the complete web application with all routes, middleware and state
///
/// Requests are cut off a little after the backend timeout so a slow backend
/// surfaces as the client's timeout error rather than a bare 408.
pub fn build_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.api.timeout_seconds.saturating_add(5));

    build_routes()
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_logging))
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(Arc::new(state))
}

/// Bind the configured address and serve until Ctrl+C
///
/// # Errors
///
/// Returns an error if the state cannot be built, the host is not an IP
/// address, or the listener fails.
pub async fn serve(config: Config) -> Result<()> {
    let host: IpAddr = config.webserver.host.parse().map_err(|e| {
        context_error!("Invalid web server host '{}': {}", config.webserver.host, e)
    })?;
    let addr = SocketAddr::new(host, config.webserver.port);

    let state = AppState::new(config)?;
    let backend = state.client.base_url().to_string();
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, %backend, "Starting almacen web server");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down gracefully");
    }
}
