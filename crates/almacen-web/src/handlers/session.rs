//! Login, logout and the current session

use crate::{
    error::WebResult,
    extractors::{OptionalSessionUser, SessionUser},
    state::AppState,
};
use almacen_client::Credentials;
use almacen_core::{
    Error as CoreError, Id, SessionClaims, session::decode_active_claims, types::Usuario,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Login form
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    /// Account email
    #[validate(email(message = "correo inválido"))]
    pub email: String,
    /// Account password
    #[validate(length(min = 1, message = "contraseña requerida"))]
    pub password: String,
}

/// The logged-in user as pages see it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// User id
    pub id: Id,
    /// Role id
    pub id_rol: Id,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    /// Email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the session token expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Full profile, when the backend returned it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario: Option<Usuario>,
}

impl From<&SessionClaims> for SessionView {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            id: claims.id,
            id_rol: claims.id_rol,
            nombre: claims.nombre.clone(),
            email: claims.email.clone(),
            expires_at: claims.expires_at(),
            usuario: None,
        }
    }
}

/// `Set-Cookie` value storing `token`, or clearing the cookie when `None`
fn session_cookie(
    name: &str,
    token: Option<&str>,
    max_age: Option<i64>,
    secure: bool,
) -> WebResult<HeaderValue> {
    let mut cookie = format!("{name}={}; Path=/; HttpOnly; SameSite=Lax", token.unwrap_or_default());
    match (token, max_age) {
        (None, _) => cookie.push_str("; Max-Age=0"),
        (Some(_), Some(seconds)) => cookie.push_str(&format!("; Max-Age={}", seconds.max(0))),
        (Some(_), None) => {}
    }
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|_| CoreError::InvalidToken("token is not a valid cookie value".to_string()).into())
}

/// Log in against the backend and store its token in the session cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> WebResult<Response> {
    form.validate().map_err(CoreError::from)?;

    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password,
    };
    let token = state.client.login(&credentials).await?;
    let now = Utc::now();
    let claims = decode_active_claims(&token, now)?;

    // A re-login may follow a role change made elsewhere.
    state.permissions.invalidate_role(claims.id_rol);

    let max_age = claims.exp.map(|exp| exp - now.timestamp());
    let cookie = session_cookie(
        &state.config.api.session_cookie,
        Some(&token),
        max_age,
        state.config.webserver.secure_cookies,
    )?;

    info!(user = claims.id, id_rol = claims.id_rol, "Logged in");
    Ok(([(header::SET_COOKIE, cookie)], Json(SessionView::from(&claims))).into_response())
}

/// Clear the session cookie and forget the permissions cached for it
pub async fn logout(
    State(state): State<Arc<AppState>>,
    OptionalSessionUser(session): OptionalSessionUser,
) -> WebResult<Response> {
    if let Some(session) = session {
        state.permissions.invalidate_session(&session.token);
        info!(user = session.claims.id, "Logged out");
    }

    let cookie = session_cookie(
        &state.config.api.session_cookie,
        None,
        None,
        state.config.webserver.secure_cookies,
    )?;
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}

/// The current user, with the backend profile when it can be fetched
pub async fn current(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
) -> Json<SessionView> {
    let mut view = SessionView::from(&session.claims);

    match state
        .client_for(&session.token)
        .resource::<Usuario>()
        .get(session.claims.id)
        .await
    {
        Ok(usuario) => view.usuario = Some(usuario),
        Err(e) => debug!(user = session.claims.id, error = %e, "Profile unavailable"),
    }

    Json(view)
}
