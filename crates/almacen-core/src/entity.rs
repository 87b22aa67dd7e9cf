//! Registry of the backend collections the admin manages
//!
//! Every admin page is the same generic list/form page parameterized by an
//! [`EntityKind`]: the kind knows its REST path, the permission route it is
//! gated by, the lists its form dropdowns need, and how to validate a
//! submitted payload.

use crate::types::{
    Area, Categoria, CentroFormacion, DetalleSolicitud, EntregaMaterial, FichaFormacion, Id,
    Inventario, Movimiento, Municipio, Opcion, Permiso, Producto, Record, Rol, Sede, Sitio,
    Solicitud, TipoSitio, Titulado, Usuario,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// One backend collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Areas
    Areas,
    /// Campuses
    Sedes,
    /// Training centers
    CentrosFormacion,
    /// Municipalities
    Municipios,
    /// Storage sites
    Sitios,
    /// Storage site kinds
    TiposSitio,
    /// Product categories
    Categorias,
    /// Products
    Productos,
    /// Stock per product and site
    Inventarios,
    /// Inventory movements
    Movimientos,
    /// Material requests
    Solicitudes,
    /// Material request line items
    DetallesSolicitud,
    /// Material deliveries
    EntregasMaterial,
    /// Users
    Usuarios,
    /// Roles
    Roles,
    /// Permission options (pages)
    Opciones,
    /// Permissions
    Permisos,
    /// Program titles
    Titulados,
    /// Training groups
    FichasFormacion,
}

impl EntityKind {
    /// Every kind, in menu order
    pub const ALL: [Self; 19] = [
        Self::Productos,
        Self::Categorias,
        Self::Inventarios,
        Self::Movimientos,
        Self::Solicitudes,
        Self::DetallesSolicitud,
        Self::EntregasMaterial,
        Self::Sitios,
        Self::TiposSitio,
        Self::Areas,
        Self::Sedes,
        Self::CentrosFormacion,
        Self::Municipios,
        Self::Titulados,
        Self::FichasFormacion,
        Self::Usuarios,
        Self::Roles,
        Self::Opciones,
        Self::Permisos,
    ];

    /// URL slug
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Areas => "areas",
            Self::Sedes => "sedes",
            Self::CentrosFormacion => "centros-formacion",
            Self::Municipios => "municipios",
            Self::Sitios => "sitios",
            Self::TiposSitio => "tipos-sitio",
            Self::Categorias => "categorias",
            Self::Productos => "productos",
            Self::Inventarios => "inventarios",
            Self::Movimientos => "movimientos",
            Self::Solicitudes => "solicitudes",
            Self::DetallesSolicitud => "detalles-solicitud",
            Self::EntregasMaterial => "entregas-material",
            Self::Usuarios => "usuarios",
            Self::Roles => "roles",
            Self::Opciones => "opciones",
            Self::Permisos => "permisos",
            Self::Titulados => "titulados",
            Self::FichasFormacion => "fichas-formacion",
        }
    }

    /// Human label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Areas => "Áreas",
            Self::Sedes => "Sedes",
            Self::CentrosFormacion => "Centros de formación",
            Self::Municipios => "Municipios",
            Self::Sitios => "Sitios",
            Self::TiposSitio => "Tipos de sitio",
            Self::Categorias => "Categorías",
            Self::Productos => "Productos",
            Self::Inventarios => "Inventario",
            Self::Movimientos => "Movimientos",
            Self::Solicitudes => "Solicitudes",
            Self::DetallesSolicitud => "Detalles de solicitud",
            Self::EntregasMaterial => "Entregas de material",
            Self::Usuarios => "Usuarios",
            Self::Roles => "Roles",
            Self::Opciones => "Opciones",
            Self::Permisos => "Permisos",
            Self::Titulados => "Titulados",
            Self::FichasFormacion => "Fichas de formación",
        }
    }

    /// Backend REST collection path
    #[must_use]
    pub fn path(self) -> String {
        format!("/{}", self.slug())
    }

    /// Permission option route this page is gated by
    #[must_use]
    pub fn route(self) -> String {
        format!("/admin/{}", self.slug())
    }

    /// Collections a form for this kind needs for its dropdowns
    #[must_use]
    pub const fn dependencies(self) -> &'static [Self] {
        match self {
            Self::Areas => &[Self::Sedes],
            Self::Sedes => &[Self::CentrosFormacion],
            Self::CentrosFormacion => &[Self::Municipios],
            Self::Sitios => &[Self::Areas, Self::TiposSitio],
            Self::Productos => &[Self::Categorias],
            Self::Inventarios => &[Self::Productos, Self::Sitios],
            Self::Movimientos => &[Self::Inventarios, Self::Usuarios],
            Self::Solicitudes => &[Self::Usuarios],
            Self::DetallesSolicitud => &[Self::Solicitudes, Self::Productos],
            Self::EntregasMaterial => &[Self::Solicitudes, Self::FichasFormacion, Self::Usuarios],
            Self::Usuarios => &[Self::Roles, Self::Areas],
            Self::Permisos => &[Self::Roles, Self::Opciones],
            Self::FichasFormacion => &[Self::Titulados, Self::Usuarios],
            Self::Municipios
            | Self::TiposSitio
            | Self::Categorias
            | Self::Roles
            | Self::Opciones
            | Self::Titulados => &[],
        }
    }

    /// Check a submitted form against this kind's record rules
    ///
    /// The payload is returned exactly as submitted, so fields the record
    /// does not model, explicit `null`s and number spellings reach the
    /// backend unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the payload does not decode or breaks
    /// a field rule.
    pub fn validate_payload(self, payload: Value) -> Result<Value> {
        match self {
            Self::Areas => check::<Area>(payload),
            Self::Sedes => check::<Sede>(payload),
            Self::CentrosFormacion => check::<CentroFormacion>(payload),
            Self::Municipios => check::<Municipio>(payload),
            Self::Sitios => check::<Sitio>(payload),
            Self::TiposSitio => check::<TipoSitio>(payload),
            Self::Categorias => check::<Categoria>(payload),
            Self::Productos => check::<Producto>(payload),
            Self::Inventarios => check::<Inventario>(payload),
            Self::Movimientos => check::<Movimiento>(payload),
            Self::Solicitudes => check::<Solicitud>(payload),
            Self::DetallesSolicitud => check::<DetalleSolicitud>(payload),
            Self::EntregasMaterial => check::<EntregaMaterial>(payload),
            Self::Usuarios => check::<Usuario>(payload),
            Self::Roles => check::<Rol>(payload),
            Self::Opciones => check::<Opcion>(payload),
            Self::Permisos => check::<Permiso>(payload),
            Self::Titulados => check::<Titulado>(payload),
            Self::FichasFormacion => check::<FichaFormacion>(payload),
        }
    }
}

fn check<T: Record>(payload: Value) -> Result<Value> {
    let record = T::deserialize(&payload)
        .map_err(|e| Error::validation(T::KIND.slug(), e.to_string()))?;
    record.validate()?;
    Ok(payload)
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| Error::not_found(format!("entity '{s}'")))
    }
}

/// Dropdown entry built from a dependent collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Record id
    pub id: Id,
    /// Display text
    pub label: String,
}

impl SelectOption {
    /// Build an option from a raw backend row, `None` when it has no id
    #[must_use]
    pub fn from_row(row: &Value) -> Option<Self> {
        let id = row.get("id")?.as_i64()?;
        let label = ["nombre", "codigo", "ruta", "email"]
            .iter()
            .find_map(|key| row.get(*key).and_then(Value::as_str))
            .map_or_else(|| format!("#{id}"), ToString::to_string);
        Some(Self { id, label })
    }
}
