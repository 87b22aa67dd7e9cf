//! Domain records mirrored from the inventory backend
//!
//! Field names follow the backend's camelCase JSON. Foreign keys are
//! [`EntityRef`]s, and every record keeps the fields it does not model in a
//! flattened `extra` map so a record read from the backend serializes back
//! without losing anything.

use crate::entity::EntityKind;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{DeserializeOwned, Error as _},
};
use serde_json::{Map, Value};
use std::fmt;
use validator::{Validate, ValidationError};

/// Backend primary key
pub type Id = i64;

/// Reference to another record, either a bare id or a nested object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    /// Bare id, e.g. `"idSede": 3`
    Id(Id),
    /// Nested object, e.g. `"idSede": {"id": 3, "nombre": "Centro"}`
    Object(RefObject),
}

/// Nested object form of an [`EntityRef`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefObject {
    /// Referenced id
    pub id: Id,
    /// Remaining fields, kept as received
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EntityRef {
    /// Referenced id
    #[must_use]
    pub const fn id(&self) -> Id {
        match self {
            Self::Id(id) => *id,
            Self::Object(object) => object.id,
        }
    }

    /// Display name carried by a nested reference, if any
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Object(object) => object.fields.get("nombre").and_then(Value::as_str),
        }
    }
}

impl From<Id> for EntityRef {
    fn from(id: Id) -> Self {
        Self::Id(id)
    }
}

/// A record the backend exposes as a REST collection
pub trait Record:
    Serialize + DeserializeOwned + Validate + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Registry entry for this record
    const KIND: EntityKind;

    /// Primary key, `None` before creation
    fn id(&self) -> Option<Id>;
}

macro_rules! impl_record {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Record for $ty {
                const KIND: EntityKind = EntityKind::$kind;

                fn id(&self) -> Option<Id> {
                    self.id
                }
            }
        )*
    };
}

impl_record! {
    Area => Areas,
    Sede => Sedes,
    CentroFormacion => CentrosFormacion,
    Municipio => Municipios,
    Sitio => Sitios,
    TipoSitio => TiposSitio,
    Categoria => Categorias,
    Producto => Productos,
    Inventario => Inventarios,
    Movimiento => Movimientos,
    Solicitud => Solicitudes,
    DetalleSolicitud => DetallesSolicitud,
    EntregaMaterial => EntregasMaterial,
    Usuario => Usuarios,
    Rol => Roles,
    Opcion => Opciones,
    Permiso => Permisos,
    Titulado => Titulados,
    FichaFormacion => FichasFormacion,
}

/// Known inventory movement types
pub const TIPOS_MOVIMIENTO: [&str; 4] = ["ENTRADA", "SALIDA", "PRESTAMO", "DEVOLUCION"];

/// Known request states
pub const ESTADOS_SOLICITUD: [&str; 4] = ["PENDIENTE", "APROBADA", "RECHAZADA", "ENTREGADA"];

/// Whole quantities arrive as integers, integral decimals, or their string
/// forms (`"12.00"`)
fn quantity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawQuantity {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    let decimal = match RawQuantity::deserialize(deserializer)? {
        RawQuantity::Integer(value) => return Ok(value),
        RawQuantity::Float(value) => Decimal::try_from(value).map_err(D::Error::custom)?,
        RawQuantity::Text(text) => text
            .trim()
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid quantity '{text}': {e}")))?,
    };

    decimal
        .fract()
        .is_zero()
        .then(|| decimal.to_i64())
        .flatten()
        .ok_or_else(|| D::Error::custom(format!("quantity {decimal} is not a whole number")))
}

fn validate_fecha(value: &str) -> Result<(), ValidationError> {
    let is_date = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    let is_datetime = chrono::DateTime::parse_from_rfc3339(value).is_ok();
    if is_date || is_datetime {
        Ok(())
    } else {
        Err(ValidationError::new("fecha").with_message("fecha inválida".into()))
    }
}

fn validate_tipo_movimiento(value: &str) -> Result<(), ValidationError> {
    if TIPOS_MOVIMIENTO
        .iter()
        .any(|known| known.eq_ignore_ascii_case(value))
    {
        Ok(())
    } else {
        Err(ValidationError::new("tipo").with_message("tipo de movimiento desconocido".into()))
    }
}

fn validate_estado_solicitud(value: &str) -> Result<(), ValidationError> {
    if ESTADOS_SOLICITUD
        .iter()
        .any(|known| known.eq_ignore_ascii_case(value))
    {
        Ok(())
    } else {
        Err(ValidationError::new("estado").with_message("estado de solicitud desconocido".into()))
    }
}

fn validate_ruta(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(ValidationError::new("ruta").with_message("la ruta debe iniciar con /".into()))
    }
}

/// Municipality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Municipio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departamento: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Training center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CentroFormacion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 150))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ubicacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, rename = "idMunicipio", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub municipio: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Campus belonging to a training center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Sede {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 150))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, rename = "idCentroFormacion", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub centro_formacion: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Area within a campus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 100, message = "el nombre es obligatorio"))]
    pub nombre: String,
    #[serde(default, rename = "idSede", skip_serializing_if = "Option::is_none")]
    #[validate(required(message = "la sede es obligatoria"))]
    pub sede: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kind of storage site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TipoSitio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Storage site inside an area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Sitio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ubicacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<bool>,
    #[serde(default, rename = "idArea", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub area: Option<EntityRef>,
    #[serde(default, rename = "idTipoSitio", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub tipo_sitio: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Categoria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub codigo_unpsc: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Producto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 150))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_sena: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perecedero: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_fecha"))]
    pub fecha_vencimiento: Option<String>,
    #[serde(default, rename = "idCategoria", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub categoria: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stock of a product at a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Inventario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(range(min = 0))]
    #[serde(deserialize_with = "quantity")]
    pub stock: i64,
    #[serde(default, rename = "idProducto", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub producto: Option<EntityRef>,
    #[serde(default, rename = "idSitio", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub sitio: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inventory movement (entry, exit, loan, return)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Movimiento {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(custom(function = "validate_tipo_movimiento"))]
    pub tipo: String,
    #[validate(range(min = 1))]
    #[serde(deserialize_with = "quantity")]
    pub cantidad: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_fecha"))]
    pub fecha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, rename = "idInventario", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub inventario: Option<EntityRef>,
    #[serde(default, rename = "idUsuario", skip_serializing_if = "Option::is_none")]
    pub usuario: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Material request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Solicitud {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_fecha"))]
    pub fecha_solicitud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_estado_solicitud"))]
    pub estado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, rename = "idUsuarioSolicitante", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub solicitante: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Line item of a material request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DetalleSolicitud {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(range(min = 1))]
    #[serde(deserialize_with = "quantity")]
    pub cantidad_solicitada: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, rename = "idSolicitud", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub solicitud: Option<EntityRef>,
    #[serde(default, rename = "idProducto", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub producto: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Delivery fulfilling a material request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntregaMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_fecha"))]
    pub fecha_entrega: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, rename = "idSolicitud", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub solicitud: Option<EntityRef>,
    #[serde(default, rename = "idFichaFormacion", skip_serializing_if = "Option::is_none")]
    pub ficha: Option<EntityRef>,
    #[serde(default, rename = "idUsuarioResponsable", skip_serializing_if = "Option::is_none")]
    pub responsable: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellido: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documento: Option<String>,
    #[validate(email(message = "correo inválido"))]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<bool>,
    /// Only sent on create or password change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8))]
    pub password: Option<String>,
    #[serde(default, rename = "idRol", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub rol: Option<EntityRef>,
    #[serde(default, rename = "idArea", skip_serializing_if = "Option::is_none")]
    pub area: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Rol {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 50))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Backend-registered page a permission applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Opcion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[validate(length(min = 1), custom(function = "validate_ruta"))]
    pub ruta: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-role, per-page capability record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Permiso {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, rename = "idRol", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub rol: Option<EntityRef>,
    #[serde(default, rename = "idOpcion", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub opcion: Option<EntityRef>,
    #[serde(default)]
    pub puede_ver: bool,
    #[serde(default)]
    pub puede_crear: bool,
    #[serde(default)]
    pub puede_editar: bool,
    #[serde(default)]
    pub puede_eliminar: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Training program title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Titulado {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 150))]
    pub nombre: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Training group (ficha) of a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FichaFormacion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[validate(length(min = 1, max = 30))]
    pub codigo: String,
    #[serde(default, rename = "idTitulado", skip_serializing_if = "Option::is_none")]
    #[validate(required)]
    pub titulado: Option<EntityRef>,
    #[serde(default, rename = "idUsuarioResponsable", skip_serializing_if = "Option::is_none")]
    pub responsable: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_entity_ref_accepts_bare_id_and_object() {
        let bare: EntityRef = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(bare.id(), 3);
        assert_eq!(bare.label(), None);

        let nested: EntityRef =
            serde_json::from_value(json!({"id": 7, "nombre": "Sede Norte", "estado": true}))
                .unwrap();
        assert_eq!(nested.id(), 7);
        assert_eq!(nested.label(), Some("Sede Norte"));
    }

    #[test]
    fn test_entity_ref_keeps_its_shape() {
        let bare = json!(3);
        let nested = json!({"id": 7, "nombre": "Sede Norte", "estado": true});

        let back_bare =
            serde_json::to_value(serde_json::from_value::<EntityRef>(bare.clone()).unwrap())
                .unwrap();
        let back_nested =
            serde_json::to_value(serde_json::from_value::<EntityRef>(nested.clone()).unwrap())
                .unwrap();

        assert_eq!(back_bare, bare);
        assert_eq!(back_nested, nested);
    }

    #[test]
    fn test_area_keeps_unknown_fields() {
        let original = json!({
            "id": 12,
            "nombre": "Bodega principal",
            "idSede": {"id": 2, "nombre": "Sede Centro"},
            "createdAt": "2024-03-01T10:00:00.000Z",
            "responsable": "Ana"
        });

        let area: Area = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(area.id, Some(12));
        assert_eq!(area.sede.as_ref().map(EntityRef::id), Some(2));
        assert_eq!(area.extra.len(), 2);

        assert_eq!(serde_json::to_value(&area).unwrap(), original);
    }

    #[test]
    fn test_area_validation() {
        let area = Area {
            id: None,
            nombre: String::new(),
            sede: None,
            extra: Map::new(),
        };
        let errors = area.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("nombre"));
        assert!(fields.contains_key("sede"));

        let area = Area {
            id: None,
            nombre: "Laboratorio".to_string(),
            sede: Some(EntityRef::Id(1)),
            extra: Map::new(),
        };
        assert!(area.validate().is_ok());
    }

    #[test]
    fn test_create_payload_omits_id() {
        let rol = Rol {
            id: None,
            nombre: "Instructor".to_string(),
            estado: Some(true),
            extra: Map::new(),
        };

        let value = serde_json::to_value(&rol).unwrap();
        assert_eq!(value, json!({"nombre": "Instructor", "estado": true}));
    }

    #[test]
    fn test_absent_optional_fields_stay_absent() {
        let original = json!({"id": 1, "nombre": "Sede Norte", "idCentroFormacion": 2});
        let sede: Sede = serde_json::from_value(original.clone()).unwrap();

        assert_eq!(sede.direccion, None);
        assert_eq!(serde_json::to_value(&sede).unwrap(), original);
    }

    #[test]
    fn test_quantities_accept_decimal_spellings() {
        let parse = |stock: Value| {
            serde_json::from_value::<Inventario>(json!({"stock": stock, "idProducto": 1, "idSitio": 2}))
                .map(|inventario| inventario.stock)
        };

        assert_eq!(parse(json!(12)).unwrap(), 12);
        assert_eq!(parse(json!(12.0)).unwrap(), 12);
        assert_eq!(parse(json!("12.00")).unwrap(), 12);
        assert_eq!(parse(json!(" 7 ")).unwrap(), 7);
        assert!(parse(json!("12.5")).is_err());
        assert!(parse(json!("mucho")).is_err());
        assert!(parse(Value::Null).is_err());
    }

    #[test]
    fn test_movimiento_rules() {
        let mut movimiento = Movimiento {
            id: None,
            tipo: "entrada".to_string(),
            cantidad: 4,
            fecha: Some("2024-05-02".to_string()),
            observaciones: None,
            inventario: Some(EntityRef::Id(9)),
            usuario: None,
            extra: Map::new(),
        };
        assert!(movimiento.validate().is_ok());

        movimiento.tipo = "TRASLADO".to_string();
        assert!(movimiento.validate().is_err());

        movimiento.tipo = "SALIDA".to_string();
        movimiento.cantidad = 0;
        assert!(movimiento.validate().is_err());

        movimiento.cantidad = 1;
        movimiento.fecha = Some("02/05/2024".to_string());
        assert!(movimiento.validate().is_err());

        movimiento.fecha = Some("2024-05-02T08:30:00Z".to_string());
        assert!(movimiento.validate().is_ok());
    }

    #[test]
    fn test_usuario_email_and_password() {
        let mut usuario: Usuario = serde_json::from_value(json!({
            "nombre": "Luis",
            "email": "luis@example.com",
            "idRol": 2
        }))
        .unwrap();
        assert!(usuario.validate().is_ok());
        assert!(
            !serde_json::to_value(&usuario)
                .unwrap()
                .as_object()
                .unwrap()
                .contains_key("password")
        );

        usuario.password = Some("corta".to_string());
        assert!(usuario.validate().is_err());

        usuario.password = None;
        usuario.email = "no-es-correo".to_string();
        assert!(usuario.validate().is_err());
    }

    #[test]
    fn test_permiso_flags_default_to_false() {
        let permiso: Permiso = serde_json::from_value(json!({
            "idRol": 1,
            "idOpcion": {"id": 4, "ruta": "/admin/areas"},
            "puedeVer": true
        }))
        .unwrap();

        assert!(permiso.puede_ver);
        assert!(!permiso.puede_crear);
        assert!(!permiso.puede_editar);
        assert!(!permiso.puede_eliminar);
        assert!(permiso.validate().is_ok());
    }

    #[test]
    fn test_opcion_route_must_be_absolute() {
        let opcion = Opcion {
            id: None,
            nombre: "Áreas".to_string(),
            descripcion: None,
            ruta: "admin/areas".to_string(),
            modulo: None,
            extra: Map::new(),
        };
        assert!(opcion.validate().is_err());
    }

    #[test]
    fn test_record_kinds() {
        assert_eq!(Area::KIND, EntityKind::Areas);
        assert_eq!(Permiso::KIND, EntityKind::Permisos);
        assert_eq!(FichaFormacion::KIND, EntityKind::FichasFormacion);
    }
}
