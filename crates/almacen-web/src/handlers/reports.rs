//! Dashboard report data

use crate::{error::WebResult, extractors::SessionUser, state::AppState};
use almacen_client::Capability;
use almacen_core::{
    EntityKind,
    reports::{self, DashboardSummary, REPORTS_ROUTE},
};
use axum::{Json, extract::State};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tracing::warn;

/// Dashboard data plus the lists that could not be loaded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsResponse {
    /// Chart series
    #[serde(flatten)]
    pub summary: DashboardSummary,
    /// Collections left out because the backend failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Chart data over every collection the session role can view
pub async fn summary(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
) -> WebResult<Json<ReportsResponse>> {
    let client = state.client_for(&session.token);
    state
        .permissions
        .require(&client, session.id_rol(), REPORTS_ROUTE, Capability::View)
        .await?;

    let rutas: Vec<String> = EntityKind::ALL.into_iter().map(EntityKind::route).collect();
    let resolved = state
        .permissions
        .resolve_many(&client, session.id_rol(), &rutas)
        .await;
    let visible: Vec<EntityKind> = EntityKind::ALL
        .into_iter()
        .zip(resolved)
        .filter(|(_, permisos)| permisos.allows(Capability::View))
        .map(|(kind, _)| kind)
        .collect();

    let mut lists = BTreeMap::new();
    let mut warnings = Vec::new();
    for (kind, result) in client.list_many(&visible).await {
        match result {
            Ok(rows) => {
                lists.insert(kind, rows);
            }
            Err(e) => {
                warn!(entity = %kind, error = %e, "Report list failed");
                warnings.push(format!("{}: {e}", kind.label()));
            }
        }
    }

    Ok(Json(ReportsResponse {
        summary: reports::summarize(&lists, state.config.reports.low_stock_threshold),
        warnings,
    }))
}
