//! Sidebar menu and per-route permission lookup

use crate::{
    error::{WebError, WebResult},
    extractors::SessionUser,
    state::AppState,
};
use almacen_client::{Capability, Permisos};
use almacen_core::{EntityKind, reports::REPORTS_ROUTE};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One visible menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    /// Entity the entry opens, `None` for the dashboard
    pub entity: Option<EntityKind>,
    /// Human label
    pub label: String,
    /// Page URL
    pub href: String,
    /// Permission route
    pub ruta: String,
    /// Flags for the route
    pub permisos: Permisos,
}

/// Menu entries the session role may view, in menu order
///
/// All routes are resolved concurrently through the shared cache.
pub async fn menu(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
) -> Json<Vec<MenuEntry>> {
    let client = state.client_for(&session.token);

    let mut targets: Vec<(Option<EntityKind>, String)> = vec![(None, "Reportes".to_string())];
    targets.extend(
        EntityKind::ALL
            .into_iter()
            .map(|kind| (Some(kind), kind.label().to_string())),
    );
    let rutas: Vec<String> = targets
        .iter()
        .map(|(entity, _)| entity.map_or_else(|| REPORTS_ROUTE.to_string(), EntityKind::route))
        .collect();

    let resolved = state
        .permissions
        .resolve_many(&client, session.id_rol(), &rutas)
        .await;

    let entries: Vec<MenuEntry> = targets
        .into_iter()
        .zip(rutas)
        .zip(resolved)
        .filter(|(_, permisos)| permisos.allows(Capability::View))
        .map(|(((entity, label), ruta), permisos)| MenuEntry {
            entity,
            label,
            href: ruta.clone(),
            ruta,
            permisos,
        })
        .collect();

    debug!(id_rol = session.id_rol(), visible = entries.len(), "Built menu");
    Json(entries)
}

/// Query of a single permission lookup
#[derive(Debug, Deserialize)]
pub struct PermisosQuery {
    /// Permission route, e.g. `/admin/areas`
    pub ruta: String,
}

/// Flags of the session role on one route
///
/// Pages that render their own controls call this instead of the backend.
pub async fn permisos(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(query): Query<PermisosQuery>,
) -> WebResult<Json<Permisos>> {
    let ruta = query.ruta.trim();
    if !ruta.starts_with('/') {
        return Err(WebError::BadRequest(format!(
            "ruta must start with '/', got '{ruta}'"
        )));
    }

    let client = state.client_for(&session.token);
    Ok(Json(
        state
            .permissions
            .resolve(&client, session.id_rol(), ruta)
            .await,
    ))
}
