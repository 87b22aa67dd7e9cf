//! Session extractor
//!
//! The session credential is the backend-issued token, read from the session
//! cookie or an `Authorization: Bearer` header. Its claims carry the role id
//! every permission lookup is keyed by; there is no other source for it.

use crate::{extractors::ExtractorError, state::AppState};
use almacen_core::{SessionClaims, session::decode_active_claims};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use std::{convert::Infallible, sync::Arc};
use tracing::debug;

/// The logged-in user of a request
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// Raw token, forwarded to the backend
    pub token: String,
    /// Decoded claims
    pub claims: SessionClaims,
}

impl SessionUser {
    /// Role id the session acts with
    #[must_use]
    pub const fn id_rol(&self) -> almacen_core::Id {
        self.claims.id_rol
    }
}

/// Value of cookie `name` in the request's `Cookie` headers
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Session token of a request, cookie first
pub(crate) fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = ExtractorError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.api.session_cookie)
            .ok_or_else(|| ExtractorError::unauthorized("Authentication required"))?
            .to_string();

        let claims = decode_active_claims(&token, chrono::Utc::now()).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ExtractorError::unauthorized(e.to_string())
        })?;

        Ok(Self { token, claims })
    }
}

/// Session user when there is one, without rejecting anonymous requests
#[derive(Debug, Clone)]
pub struct OptionalSessionUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalSessionUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(SessionUser::from_request_parts(parts, state).await.ok()))
    }
}
