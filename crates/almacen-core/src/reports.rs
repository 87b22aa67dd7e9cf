//! Dashboard summaries computed from fetched collections
//!
//! These feed the dashboard charts; rendering them is up to the page.

use crate::entity::EntityKind;
use crate::types::{EntityRef, Id, Inventario, Movimiento, Record, Solicitud};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Permission route the dashboard reports are gated by
pub const REPORTS_ROUTE: &str = "/admin/reportes";

/// One bar/slice of a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Category label
    pub label: String,
    /// Value
    pub value: i64,
}

/// Record count of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCount {
    /// Collection
    pub entity: EntityKind,
    /// Human label
    pub label: String,
    /// Number of records
    pub total: usize,
}

/// Inventory row at or below the low-stock threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    /// Inventory row id
    pub inventario: Option<Id>,
    /// Product label
    pub producto: String,
    /// Site label
    pub sitio: String,
    /// Units in stock
    pub stock: i64,
}

/// Everything the dashboard charts need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Record counts for the collections the role can see
    pub counts: Vec<EntityCount>,
    /// Units in stock per site
    pub stock_by_site: Vec<ChartPoint>,
    /// Inventory rows running low, lowest first
    pub low_stock: Vec<LowStockItem>,
    /// Requests per status
    pub solicitudes_by_estado: Vec<ChartPoint>,
    /// Units moved per movement type
    pub movimientos_by_tipo: Vec<ChartPoint>,
}

/// Decode the rows that fit `T`, skipping the ones that do not
fn decode_rows<T: Record>(rows: &[Value]) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match serde_json::from_value(row.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(entity = %T::KIND, error = %e, "Skipping row in report");
                None
            }
        })
        .collect()
}

fn ref_label(reference: Option<&EntityRef>, prefix: &str) -> String {
    reference.map_or_else(
        || format!("Sin {}", prefix.to_lowercase()),
        |r| {
            r.label()
                .map_or_else(|| format!("{prefix} #{}", r.id()), ToString::to_string)
        },
    )
}

fn into_points(totals: BTreeMap<String, i64>) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = totals
        .into_iter()
        .map(|(label, value)| ChartPoint { label, value })
        .collect();
    points.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    points
}

/// Units in stock per site, largest first
#[must_use]
pub fn stock_by_site(inventarios: &[Value]) -> Vec<ChartPoint> {
    let mut totals = BTreeMap::new();
    for row in decode_rows::<Inventario>(inventarios) {
        *totals
            .entry(ref_label(row.sitio.as_ref(), "Sitio"))
            .or_insert(0) += row.stock;
    }
    into_points(totals)
}

/// Inventory rows whose stock is at or below `threshold`, lowest first
#[must_use]
pub fn low_stock(inventarios: &[Value], threshold: i64) -> Vec<LowStockItem> {
    let mut items: Vec<LowStockItem> = decode_rows::<Inventario>(inventarios)
        .into_iter()
        .filter(|row| row.stock <= threshold)
        .map(|row| LowStockItem {
            inventario: row.id,
            producto: ref_label(row.producto.as_ref(), "Producto"),
            sitio: ref_label(row.sitio.as_ref(), "Sitio"),
            stock: row.stock,
        })
        .collect();
    items.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.producto.cmp(&b.producto)));
    items
}

/// Number of requests per status
#[must_use]
pub fn solicitudes_by_estado(solicitudes: &[Value]) -> Vec<ChartPoint> {
    let mut totals = BTreeMap::new();
    for row in decode_rows::<Solicitud>(solicitudes) {
        let estado = row
            .estado
            .map_or_else(|| "SIN ESTADO".to_string(), |e| e.to_uppercase());
        *totals.entry(estado).or_insert(0) += 1;
    }
    into_points(totals)
}

/// Units moved per movement type
#[must_use]
pub fn movimientos_by_tipo(movimientos: &[Value]) -> Vec<ChartPoint> {
    let mut totals = BTreeMap::new();
    for row in decode_rows::<Movimiento>(movimientos) {
        *totals.entry(row.tipo.to_uppercase()).or_insert(0) += row.cantidad;
    }
    into_points(totals)
}

/// Record counts in menu order
#[must_use]
pub fn entity_counts(lists: &BTreeMap<EntityKind, Vec<Value>>) -> Vec<EntityCount> {
    EntityKind::ALL
        .into_iter()
        .filter_map(|kind| {
            lists.get(&kind).map(|rows| EntityCount {
                entity: kind,
                label: kind.label().to_string(),
                total: rows.len(),
            })
        })
        .collect()
}

/// Build the whole dashboard from the collections that were fetched
///
/// Collections missing from `lists` (not visible to the role, or failed to
/// load) simply leave their charts empty.
#[must_use]
pub fn summarize(
    lists: &BTreeMap<EntityKind, Vec<Value>>,
    low_stock_threshold: i64,
) -> DashboardSummary {
    let rows = |kind: EntityKind| lists.get(&kind).map_or(&[][..], Vec::as_slice);

    DashboardSummary {
        counts: entity_counts(lists),
        stock_by_site: stock_by_site(rows(EntityKind::Inventarios)),
        low_stock: low_stock(rows(EntityKind::Inventarios), low_stock_threshold),
        solicitudes_by_estado: solicitudes_by_estado(rows(EntityKind::Solicitudes)),
        movimientos_by_tipo: movimientos_by_tipo(rows(EntityKind::Movimientos)),
    }
}
