//! Shared helpers for the web integration tests

#![allow(dead_code, clippy::missing_panics_doc, clippy::unwrap_used, unreachable_pub)]

use almacen_core::{Config, SessionClaims, session::encode_unsigned};
use almacen_web::{AppState, build_app};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

/// Role every test session acts with
pub const ID_ROL: i64 = 2;

/// A web app wired to a mock backend
pub struct TestApp {
    pub backend: MockServer,
    pub app: Router,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let backend = MockServer::start().await;
        let mut config = Config::default();
        config.api.base_url = backend.uri();

        let app = build_app(AppState::new(config).unwrap());
        Self {
            backend,
            app,
            token: session_token(7, ID_ROL, Some(4_102_444_800)),
        }
    }

    /// Send a request carrying the session cookie
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        self.send(build_request(method, uri, body, Some(&self.token)))
            .await
    }

    /// Send a request as is
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// Request with an optional JSON body and session cookie
pub fn build_request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Unsigned session token for `id` acting as `id_rol`
pub fn session_token(id: i64, id_rol: i64, exp: Option<i64>) -> String {
    encode_unsigned(&SessionClaims {
        id,
        id_rol,
        nombre: Some("Ana Torres".to_string()),
        email: Some("ana@example.com".to_string()),
        exp,
    })
    .unwrap()
}

/// Read a response body as JSON, `null` when empty
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Permission flags as the backend sends them
pub fn flags(ver: bool, crear: bool, editar: bool, eliminar: bool) -> Value {
    json!({
        "puedeVer": ver,
        "puedeCrear": crear,
        "puedeEditar": editar,
        "puedeEliminar": eliminar
    })
}

/// Answer permission lookups for `ruta` with `body`
pub async fn grant(server: &MockServer, ruta: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/permisos/por-ruta"))
        .and(query_param("ruta", ruta))
        .and(query_param("idRol", ID_ROL.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Deny every permission lookup not granted explicitly
pub async fn deny_rest(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/permisos/por-ruta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flags(false, false, false, false)))
        .mount(server)
        .await;
}
