//! HTTP client for the inventory backend REST API

use almacen_core::{EntityKind, Error, Id, Result, config::ApiConfig};
use futures::future::join_all;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// Login form forwarded to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// API client for the backend's REST collections
///
/// Cloning is cheap; the underlying connection pool is shared. A client
/// bound to a session (see [`ApiClient::with_session_token`]) forwards the
/// token both as the session cookie and as a bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    session_cookie: String,
    permissions_path: String,
    login_path: String,
    session_token: Option<String>,
}

impl ApiClient {
    /// Create a client from the API configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("cannot build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            session_cookie: config.session_cookie.clone(),
            permissions_path: config.permissions_path.clone(),
            login_path: config.login_path.clone(),
            session_token: None,
        })
    }

    /// Create a client for `base_url` with default settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        })
    }

    /// A copy of this client that forwards `token` on every request
    #[must_use]
    pub fn with_session_token(&self, token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Session token this client forwards, if bound to one
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Backend base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path of the permission lookup endpoint
    #[must_use]
    pub fn permissions_path(&self) -> &str {
        &self.permissions_path
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{path}", self.base_url));

        match &self.session_token {
            Some(token) => request
                .header(header::COOKIE, format!("{}={token}", self.session_cookie))
                .bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, path, &body))
    }

    fn transport_error(&self, error: &reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::Transport(error.to_string())
        }
    }

    async fn read_json(&self, response: Response) -> Result<Value> {
        let text = response.text().await.map_err(|e| self.transport_error(&e))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// GET an arbitrary backend path with query parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend answers with a
    /// non-success status, or the body is not JSON.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let request = self.request(Method::GET, path).query(query);
        let response = self.send(request, path).await?;
        self.read_json(response).await
    }

    /// Fetch every record of a collection
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is neither a JSON
    /// array nor an object wrapping one in `data`.
    #[instrument(skip(self), fields(entity = %kind))]
    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Value>> {
        let path = kind.path();
        let response = self.send(self.request(Method::GET, &path), &path).await?;
        let rows = unwrap_list(self.read_json(response).await?)
            .ok_or_else(|| Error::Other(format!("{path} did not return a list")))?;
        debug!(rows = rows.len(), "Fetched list");
        Ok(rows)
    }

    /// Fetch several collections concurrently
    ///
    /// Results come back in the order of `kinds`, each with its own outcome.
    pub async fn list_many(&self, kinds: &[EntityKind]) -> Vec<(EntityKind, Result<Vec<Value>>)> {
        join_all(
            kinds
                .iter()
                .map(|&kind| async move { (kind, self.list(kind).await) }),
        )
        .await
    }

    /// Fetch one record by id
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the record does not exist.
    #[instrument(skip(self), fields(entity = %kind))]
    pub async fn get(&self, kind: EntityKind, id: Id) -> Result<Value> {
        let path = format!("{}/{id}", kind.path());
        let response = self.send(self.request(Method::GET, &path), &path).await?;
        self.read_json(response).await
    }

    /// Create a record, returning what the backend answered
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the payload.
    #[instrument(skip(self, payload), fields(entity = %kind))]
    pub async fn create(&self, kind: EntityKind, payload: &Value) -> Result<Value> {
        let path = kind.path();
        let request = self.request(Method::POST, &path).json(payload);
        let response = self.send(request, &path).await?;
        self.read_json(response).await
    }

    /// Replace a record by id
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the record does not exist, or an
    /// error if the backend rejects the payload.
    #[instrument(skip(self, payload), fields(entity = %kind))]
    pub async fn update(&self, kind: EntityKind, id: Id, payload: &Value) -> Result<Value> {
        let path = format!("{}/{id}", kind.path());
        let request = self.request(Method::PUT, &path).json(payload);
        let response = self.send(request, &path).await?;
        self.read_json(response).await
    }

    /// Delete a record by id
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the record does not exist; a missing
    /// record is never reported as a successful delete.
    #[instrument(skip(self), fields(entity = %kind))]
    pub async fn delete(&self, kind: EntityKind, id: Id) -> Result<()> {
        let path = format!("{}/{id}", kind.path());
        self.send(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }

    /// Log in and return the session token the backend issued
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] for rejected credentials or a
    /// response without a token.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let request = self.request(Method::POST, &self.login_path).json(credentials);
        let response = self.send(request, &self.login_path).await?;
        let body = self.read_json(response).await?;

        ["token", "access_token", "accessToken"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(ToString::to_string)
            .ok_or_else(|| Error::Authentication("login response carried no token".to_string()))
    }
}

/// Accept a bare array or an object wrapping one in `data`
fn unwrap_list(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(rows) => Some(rows),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => Some(rows),
            _ => None,
        },
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

fn status_error(status: StatusCode, path: &str, body: &str) -> Error {
    let message = body_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    });

    match status {
        StatusCode::NOT_FOUND => Error::not_found(path),
        StatusCode::UNAUTHORIZED => Error::Authentication(message),
        StatusCode::FORBIDDEN => Error::Forbidden {
            ruta: path.to_string(),
            capability: "backend".to_string(),
        },
        _ => Error::Http {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull a human message out of an error body
fn body_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => ["message", "mensaje", "error"]
            .iter()
            .find_map(|key| json.get(*key))
            .map(|value| match value {
                Value::String(text) => text.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map_or_else(|| item.to_string(), ToString::to_string))
                    .collect::<Vec<_>>()
                    .join("; "),
                other => other.to_string(),
            }),
        Err(_) => Some(trimmed.chars().take(200).collect()),
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_unwrap_list_shapes() {
        assert_eq!(unwrap_list(json!([{"id": 1}])), Some(vec![json!({"id": 1})]));
        assert_eq!(
            unwrap_list(json!({"data": [{"id": 2}], "total": 1})),
            Some(vec![json!({"id": 2})])
        );
        assert_eq!(unwrap_list(Value::Null), Some(Vec::new()));
        assert_eq!(unwrap_list(json!({"rows": []})), None);
        assert_eq!(unwrap_list(json!("texto")), None);
    }

    #[rstest]
    #[case(r#"{"message": "nombre es requerido"}"#, Some("nombre es requerido"))]
    #[case(r#"{"message": ["a", "b"], "statusCode": 400}"#, Some("a; b"))]
    #[case(r#"{"error": "Bad Request"}"#, Some("Bad Request"))]
    #[case("Internal Server Error", Some("Internal Server Error"))]
    #[case("   ", None)]
    fn test_body_message(#[case] body: &str, #[case] expected: Option<&str>) {
        assert_eq!(body_message(body).as_deref(), expected);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "/areas/9", ""),
            Error::NotFound { resource } if resource == "/areas/9"
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "/areas", r#"{"message":"token vencido"}"#),
            Error::Authentication(msg) if msg == "token vencido"
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "/areas", ""),
            Error::Forbidden { .. }
        ));
        match status_error(StatusCode::BAD_REQUEST, "/areas", "") {
            Error::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad Request");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn test_with_session_token_keeps_settings() {
        let client = ApiClient::new("http://localhost:3000/").unwrap();
        let bound = client.with_session_token("abc");

        assert_eq!(bound.base_url(), "http://localhost:3000");
        assert_eq!(bound.session_token.as_deref(), Some("abc"));
        assert_eq!(client.session_token, None);
    }
}
