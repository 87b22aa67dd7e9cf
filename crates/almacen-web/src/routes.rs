//! Route definitions for the web interface

use crate::{
    handlers::{entities, health, menu, pages, reports, session},
    state::AppState,
};
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

/// HTML page shells
pub fn page_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(pages::dashboard))
        .route("/admin/reportes", get(pages::dashboard))
        .route("/login", get(pages::login_page))
        .route("/admin/:entity", get(pages::entity_page))
}

/// JSON API the pages call
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/entities/:entity",
            get(entities::list_entities).post(entities::create_entity),
        )
        .route(
            "/api/entities/:entity/:id",
            get(entities::get_entity)
                .put(entities::update_entity)
                .delete(entities::delete_entity),
        )
        .route("/api/menu", get(menu::menu))
        .route("/api/permisos", get(menu::permisos))
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/session", get(session::current))
        .route("/api/session/login", post(session::login))
        .route("/api/session/logout", post(session::logout))
}

/// Health check routes (no session required)
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health::health_check))
}

/// Combine all routes into a single router
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(page_routes())
        .merge(api_routes())
        .merge(health_routes())
        .fallback(not_found_handler)
}

/// Handle 404 Not Found errors
async fn not_found_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "The requested endpoint does not exist",
            "code": "ROUTE_NOT_FOUND"
        })),
    )
}
