//! Per-route permission resolution
//!
//! A role's capabilities on a page come from the backend's
//! `permisos/por-ruta` lookup. [`PermissionProvider`] caches them per
//! session and `(idRol, ruta)` pair so the pages, the menu and the mutation
//! handlers of one session share a single fetch, and fails closed: anything
//! short of a successful answer denies everything.

use crate::client::ApiClient;
use almacen_core::{Error, Id, Result, config::PermissionsConfig};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc, time::Duration};
use tokio::{sync::OnceCell, time::Instant};
use tracing::{debug, warn};

/// The four capability flags of a role on one route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permisos {
    /// May open the page and list records
    #[serde(default, deserialize_with = "flag")]
    pub puede_ver: bool,
    /// May create records
    #[serde(default, deserialize_with = "flag")]
    pub puede_crear: bool,
    /// May edit records
    #[serde(default, deserialize_with = "flag")]
    pub puede_editar: bool,
    /// May delete records
    #[serde(default, deserialize_with = "flag")]
    pub puede_eliminar: bool,
}

/// Flags arrive as booleans, `0`/`1`, or their string forms
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Number(i64),
        Text(String),
        Null(()),
    }

    Ok(match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(value) => value,
        RawFlag::Number(value) => value != 0,
        RawFlag::Text(text) => matches!(text.trim(), "1" | "true" | "TRUE" | "True"),
        RawFlag::Null(()) => false,
    })
}

/// One of the four capabilities a route grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// `puedeVer`
    View,
    /// `puedeCrear`
    Create,
    /// `puedeEditar`
    Edit,
    /// `puedeEliminar`
    Delete,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::View => "puedeVer",
            Self::Create => "puedeCrear",
            Self::Edit => "puedeEditar",
            Self::Delete => "puedeEliminar",
        })
    }
}

impl Permisos {
    /// Everything denied, the fail-closed default
    pub const DENIED: Self = Self {
        puede_ver: false,
        puede_crear: false,
        puede_editar: false,
        puede_eliminar: false,
    };

    /// Everything granted
    #[must_use]
    pub const fn full() -> Self {
        Self {
            puede_ver: true,
            puede_crear: true,
            puede_editar: true,
            puede_eliminar: true,
        }
    }

    /// Mutations only count when the page itself is visible
    #[must_use]
    pub const fn normalized(self) -> Self {
        if self.puede_ver { self } else { Self::DENIED }
    }

    /// Whether `capability` is granted
    #[must_use]
    pub const fn allows(self, capability: Capability) -> bool {
        let normalized = self.normalized();
        match capability {
            Capability::View => normalized.puede_ver,
            Capability::Create => normalized.puede_crear,
            Capability::Edit => normalized.puede_editar,
            Capability::Delete => normalized.puede_eliminar,
        }
    }
}

/// Decode a permission lookup body
///
/// The backend answers with the flag object itself, wraps it in
/// `{"permisos": ...}`, returns a one-element array, or returns `null` when
/// the role has no row for the route.
///
/// # Errors
///
/// Returns an error when the body has none of those shapes.
pub fn parse_permisos(body: Value) -> Result<Permisos> {
    match body {
        Value::Null => Ok(Permisos::DENIED),
        Value::Array(rows) => rows
            .into_iter()
            .next()
            .map_or(Ok(Permisos::DENIED), parse_permisos),
        Value::Object(mut map) => match map.remove("permisos") {
            Some(inner) => parse_permisos(inner),
            None => Ok(serde_json::from_value(Value::Object(map))?),
        },
        other => Err(Error::Other(format!(
            "unexpected permission body: {other}"
        ))),
    }
}

/// Where permission flags come from
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Fetch the flags of `id_rol` on `ruta`
    async fn fetch_permissions(&self, id_rol: Id, ruta: &str) -> Result<Permisos>;

    /// Credential the lookups are made with; cache entries are scoped to it
    fn session(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
impl PermissionSource for ApiClient {
    async fn fetch_permissions(&self, id_rol: Id, ruta: &str) -> Result<Permisos> {
        let body = self
            .get_json(
                self.permissions_path(),
                &[("ruta", ruta.to_string()), ("idRol", id_rol.to_string())],
            )
            .await?;
        parse_permisos(body)
    }

    fn session(&self) -> Option<&str> {
        self.session_token()
    }
}

/// Cache key: the session credential plus the role and route it asked for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    session: String,
    id_rol: Id,
    ruta: String,
}

impl CacheKey {
    fn new<S>(source: &S, id_rol: Id, ruta: &str) -> Self
    where
        S: PermissionSource + ?Sized,
    {
        Self {
            session: source.session().unwrap_or_default().to_string(),
            id_rol,
            ruta: ruta.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheEntry {
    cell: OnceCell<(Permisos, Instant)>,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match (self.cell.get(), ttl) {
            (Some((_, fetched_at)), Some(ttl)) => fetched_at.elapsed() >= ttl,
            _ => false,
        }
    }
}

/// Cached, fail-closed permission resolver shared by the whole service
///
/// Entries belong to the session credential that fetched them: a token
/// claiming the same role never sees another session's grants without the
/// backend answering for it. Concurrent lookups of the same key share one
/// in-flight request. Failed lookups are not cached. Invalidation detaches
/// entries from the map, so a lookup still in flight at that moment cannot
/// write its now-stale answer back into the cache.
#[derive(Debug)]
pub struct PermissionProvider {
    entries: DashMap<CacheKey, Arc<CacheEntry>>,
    enabled: bool,
    ttl: Option<Duration>,
}

impl Default for PermissionProvider {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl PermissionProvider {
    /// Create a provider; a `ttl` of `None` keeps entries until invalidated
    #[must_use]
    pub fn new(enabled: bool, ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            enabled,
            ttl,
        }
    }

    /// Create a provider from the permissions configuration section
    #[must_use]
    pub fn from_config(config: &PermissionsConfig) -> Self {
        Self::new(config.cache_enabled, config.ttl())
    }

    fn entry(&self, key: CacheKey) -> Arc<CacheEntry> {
        if !self.entries.contains_key(&key) {
            self.prune_expired();
        }
        let mut slot = self.entries.entry(key).or_default();
        if slot.is_expired(self.ttl) {
            *slot = Arc::default();
        }
        Arc::clone(&slot)
    }

    /// Resolve the flags of `id_rol` on `ruta`, surfacing lookup failures
    ///
    /// # Errors
    ///
    /// Returns the source's error; nothing is cached in that case.
    pub async fn try_resolve<S>(&self, source: &S, id_rol: Id, ruta: &str) -> Result<Permisos>
    where
        S: PermissionSource + ?Sized,
    {
        if !self.enabled {
            return Ok(source.fetch_permissions(id_rol, ruta).await?.normalized());
        }

        let entry = self.entry(CacheKey::new(source, id_rol, ruta));
        let (permisos, _) = entry
            .cell
            .get_or_try_init(|| async {
                debug!(id_rol, ruta, "Fetching permissions");
                let permisos = source.fetch_permissions(id_rol, ruta).await?;
                Ok::<_, Error>((permisos.normalized(), Instant::now()))
            })
            .await?;
        Ok(*permisos)
    }

    /// Resolve the flags of `id_rol` on `ruta`, denying everything on failure
    pub async fn resolve<S>(&self, source: &S, id_rol: Id, ruta: &str) -> Permisos
    where
        S: PermissionSource + ?Sized,
    {
        match self.try_resolve(source, id_rol, ruta).await {
            Ok(permisos) => permisos,
            Err(e) => {
                warn!(id_rol, ruta, error = %e, "Permission lookup failed, denying access");
                Permisos::DENIED
            }
        }
    }

    /// Resolve several routes concurrently, in the order given
    pub async fn resolve_many<S>(&self, source: &S, id_rol: Id, rutas: &[String]) -> Vec<Permisos>
    where
        S: PermissionSource + ?Sized,
    {
        join_all(rutas.iter().map(|ruta| self.resolve(source, id_rol, ruta))).await
    }

    /// Resolve and require one capability
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] when the capability is not granted,
    /// including when the lookup itself failed.
    pub async fn require<S>(
        &self,
        source: &S,
        id_rol: Id,
        ruta: &str,
        capability: Capability,
    ) -> Result<Permisos>
    where
        S: PermissionSource + ?Sized,
    {
        let permisos = self.resolve(source, id_rol, ruta).await;
        if permisos.allows(capability) {
            Ok(permisos)
        } else {
            Err(Error::Forbidden {
                ruta: ruta.to_string(),
                capability: capability.to_string(),
            })
        }
    }

    /// Cached flags of `source`'s session for a pair, if a lookup has
    /// completed and not expired
    #[must_use]
    pub fn cached<S>(&self, source: &S, id_rol: Id, ruta: &str) -> Option<Permisos>
    where
        S: PermissionSource + ?Sized,
    {
        let entry = self.entries.get(&CacheKey::new(source, id_rol, ruta))?;
        if entry.is_expired(self.ttl) {
            return None;
        }
        entry.cell.get().map(|(permisos, _)| *permisos)
    }

    /// Drop every cached entry of one role, across sessions
    pub fn invalidate_role(&self, id_rol: Id) {
        self.entries.retain(|key, _| key.id_rol != id_rol);
        debug!(id_rol, "Invalidated cached permissions");
    }

    /// Drop every cached entry fetched with one session credential
    pub fn invalidate_session(&self, session: &str) {
        self.entries.retain(|key, _| key.session != session);
        debug!("Invalidated cached permissions of a session");
    }

    /// Number of cached entries, expired ones included until pruned
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune_expired(&self) {
        if self.ttl.is_some() {
            self.entries.retain(|_, entry| !entry.is_expired(self.ttl));
        }
    }

    /// Drop every cached entry
    pub fn invalidate_all(&self) {
        self.entries.clear();
        debug!("Invalidated all cached permissions");
    }
}
