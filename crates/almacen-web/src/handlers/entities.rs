//! Generic permission-gated entity pages and CRUD
//!
//! Every admin collection goes through the same handlers, parameterized by
//! the [`EntityKind`] in the path.

use crate::{
    error::WebResult,
    extractors::{ListQuery, SessionUser},
    state::AppState,
};
use almacen_client::{Capability, Permisos};
use almacen_core::{
    EntityKind, EntityRef, Id, PaginationMeta, SelectOption, table::SortSpec,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};

/// View model of one entity list page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPage {
    /// Collection shown
    pub entity: EntityKind,
    /// Human label
    pub label: &'static str,
    /// Permission route the page is gated by
    pub ruta: String,
    /// Flags the page uses to show or hide its controls
    pub permisos: Permisos,
    /// Whether only the denial panel is shown
    pub denied: bool,
    /// Message for the denial panel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Rows of the current page
    pub rows: Vec<Value>,
    /// Pagination of the filtered list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    /// Active filter text
    pub filter: String,
    /// Active sort
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Dropdown options per dependent collection
    pub options: BTreeMap<EntityKind, Vec<SelectOption>>,
    /// Dependent lists that failed to load
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EntityPage {
    fn denied(kind: EntityKind, ruta: String, permisos: Permisos) -> Self {
        Self {
            entity: kind,
            label: kind.label(),
            ruta,
            permisos,
            denied: true,
            message: Some(format!(
                "No tiene permiso para ver {}",
                kind.label().to_lowercase()
            )),
            rows: Vec::new(),
            pagination: None,
            filter: String::new(),
            sort: None,
            options: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }
}

/// List page for one collection
///
/// Without `puedeVer` the response is the denial panel alone and the
/// collection is never requested from the backend.
pub async fn list_entities(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(slug): Path<String>,
    query: ListQuery,
) -> WebResult<Response> {
    let kind: EntityKind = slug.parse()?;
    let client = state.client_for(&session.token);
    let ruta = kind.route();
    let permisos = state
        .permissions
        .resolve(&client, session.id_rol(), &ruta)
        .await;

    if !permisos.allows(Capability::View) {
        info!(entity = %kind, id_rol = session.id_rol(), "List denied");
        let page = EntityPage::denied(kind, ruta, permisos);
        return Ok((StatusCode::FORBIDDEN, Json(page)).into_response());
    }

    let (rows, dependencies) =
        tokio::join!(client.list(kind), client.list_many(kind.dependencies()));
    let rows = rows?;

    let mut options = BTreeMap::new();
    let mut warnings = Vec::new();
    for (dependency, result) in dependencies {
        let entries = match result {
            Ok(list) => list.iter().filter_map(SelectOption::from_row).collect(),
            Err(e) => {
                warn!(entity = %kind, dependency = %dependency, error = %e, "Dependent list failed");
                warnings.push(format!("{}: {e}", dependency.label()));
                Vec::new()
            }
        };
        options.insert(dependency, entries);
    }

    let table = query.table_state(&state.config.table);
    let page = table.apply(&rows);

    Ok(Json(EntityPage {
        entity: kind,
        label: kind.label(),
        ruta,
        permisos,
        denied: false,
        message: None,
        rows: page.rows,
        pagination: Some(page.pagination),
        filter: table.filter().to_string(),
        sort: table.sort().cloned(),
        options,
        warnings,
    })
    .into_response())
}

/// One record, for the edit form
pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path((slug, id)): Path<(String, Id)>,
) -> WebResult<Json<Value>> {
    let kind: EntityKind = slug.parse()?;
    let client = state.client_for(&session.token);
    state
        .permissions
        .require(&client, session.id_rol(), &kind.route(), Capability::View)
        .await?;

    Ok(Json(client.get(kind, id).await?))
}

/// Create a record
///
/// An identical create still in flight is rejected with 409.
pub async fn create_entity(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path(slug): Path<String>,
    Json(payload): Json<Value>,
) -> WebResult<Response> {
    let kind: EntityKind = slug.parse()?;
    let client = state.client_for(&session.token);
    state
        .permissions
        .require(&client, session.id_rol(), &kind.route(), Capability::Create)
        .await?;

    let payload = kind.validate_payload(payload)?;
    let created = {
        let _ticket = state.submissions.try_acquire(kind, &payload)?;
        client.create(kind, &payload).await?
    };
    invalidate_after_write(&state, kind, None, &payload);
    info!(entity = %kind, user = session.claims.id, "Created record");

    let body = if created.is_null() { payload } else { created };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Replace a record
pub async fn update_entity(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path((slug, id)): Path<(String, Id)>,
    Json(payload): Json<Value>,
) -> WebResult<Json<Value>> {
    let kind: EntityKind = slug.parse()?;
    let client = state.client_for(&session.token);
    state
        .permissions
        .require(&client, session.id_rol(), &kind.route(), Capability::Edit)
        .await?;

    let payload = kind.validate_payload(payload)?;
    let updated = client.update(kind, id, &payload).await?;
    invalidate_after_write(&state, kind, Some(id), &payload);
    info!(entity = %kind, id, user = session.claims.id, "Updated record");

    Ok(Json(if updated.is_null() { payload } else { updated }))
}

/// Delete a record; a missing id is a 404, never a success
pub async fn delete_entity(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Path((slug, id)): Path<(String, Id)>,
) -> WebResult<StatusCode> {
    let kind: EntityKind = slug.parse()?;
    let client = state.client_for(&session.token);
    state
        .permissions
        .require(&client, session.id_rol(), &kind.route(), Capability::Delete)
        .await?;

    client.delete(kind, id).await?;
    invalidate_after_write(&state, kind, Some(id), &Value::Null);
    info!(entity = %kind, id, user = session.claims.id, "Deleted record");

    Ok(StatusCode::NO_CONTENT)
}

/// Drop cached permissions a write to roles, permissions or options affects
fn invalidate_after_write(state: &AppState, kind: EntityKind, id: Option<Id>, payload: &Value) {
    match (kind, id) {
        (EntityKind::Roles, Some(id_rol)) => state.permissions.invalidate_role(id_rol),
        // A new permission row only affects its own role; an edit may move
        // the row between roles.
        (EntityKind::Permisos, None) => match role_of(payload) {
            Some(id_rol) => state.permissions.invalidate_role(id_rol),
            None => state.permissions.invalidate_all(),
        },
        (EntityKind::Permisos | EntityKind::Opciones, _) => state.permissions.invalidate_all(),
        _ => {}
    }
}

fn role_of(payload: &Value) -> Option<Id> {
    payload
        .get("idRol")
        .cloned()
        .and_then(|value| serde_json::from_value::<EntityRef>(value).ok())
        .map(|reference| reference.id())
}
