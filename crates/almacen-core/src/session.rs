//! Session token decoding
//!
//! The backend issues a signed JWT and verifies it on every call. The admin
//! front end only needs the claims (who is logged in and with which role), so
//! it decodes the payload segment without checking the signature.

use crate::{Error, Result, types::Id};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Claims carried by the backend session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    #[serde(alias = "idUsuario", deserialize_with = "id_or_string")]
    pub id: Id,

    /// Role id, the key for permission lookups
    #[serde(rename = "idRol", alias = "rol", deserialize_with = "id_or_string")]
    pub id_rol: Id,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,

    /// Email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Expiry as seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Ids sometimes arrive as strings (`"3"`) or as nested objects (`{"id": 3}`)
fn id_or_string<'de, D>(deserializer: D) -> std::result::Result<Id, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(Id),
        Text(String),
        Object { id: Id },
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) | RawId::Object { id } => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl SessionClaims {
    /// Whether the token has expired at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now.timestamp())
    }

    /// Expiry as a timestamp, if the token carries one
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the claims of a JWT without verifying its signature
///
/// # Errors
///
/// Returns [`Error::InvalidToken`] when the token is not three dot-separated
/// segments or the payload is not base64url-encoded JSON claims.
pub fn decode_claims(token: &str) -> Result<SessionClaims> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(Error::InvalidToken("expected three segments".to_string())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::InvalidToken(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidToken(format!("payload is not valid claims: {e}")))
}

/// Decode claims and reject expired tokens
///
/// # Errors
///
/// Returns [`Error::InvalidToken`] for malformed tokens and
/// [`Error::Authentication`] for expired ones.
pub fn decode_active_claims(token: &str, now: DateTime<Utc>) -> Result<SessionClaims> {
    let claims = decode_claims(token)?;
    if claims.is_expired_at(now) {
        return Err(Error::Authentication("session expired".to_string()));
    }
    Ok(claims)
}

/// Build an unsigned token carrying `claims`, for tests and local tooling
///
/// # Errors
///
/// Returns an error if the claims cannot be serialized.
pub fn encode_unsigned(claims: &SessionClaims) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{header}.{payload}.unsigned"))
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token_with(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_claims() {
        let token = token_with(r#"{"id":7,"idRol":2,"nombre":"Marta","exp":4102444800}"#);
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.id, 7);
        assert_eq!(claims.id_rol, 2);
        assert_eq!(claims.nombre.as_deref(), Some("Marta"));
        assert_eq!(claims.exp, Some(4_102_444_800));
    }

    #[test]
    fn test_decode_claims_aliases_and_string_ids() {
        let token = token_with(r#"{"idUsuario":"15","rol":{"id":3,"nombre":"Almacenista"}}"#);
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.id, 15);
        assert_eq!(claims.id_rol, 3);
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        assert!(matches!(decode_claims("abc"), Err(Error::InvalidToken(_))));
        assert!(matches!(decode_claims("a..c"), Err(Error::InvalidToken(_))));
        assert!(matches!(decode_claims("a.b.c.d"), Err(Error::InvalidToken(_))));
        assert!(matches!(
            decode_claims("a.!!!.c"),
            Err(Error::InvalidToken(_))
        ));
        assert!(matches!(
            decode_claims(&token_with(r#"{"nombre":"sin rol"}"#)),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expiry() {
        let token = token_with(r#"{"id":1,"idRol":1,"exp":1000}"#);
        let before = DateTime::from_timestamp(999, 0).unwrap();
        let after = DateTime::from_timestamp(1000, 0).unwrap();

        assert!(decode_active_claims(&token, before).is_ok());
        assert!(matches!(
            decode_active_claims(&token, after),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn test_encode_unsigned_roundtrip() {
        let claims = SessionClaims {
            id: 4,
            id_rol: 9,
            nombre: Some("Ana".to_string()),
            email: None,
            exp: None,
        };

        let token = encode_unsigned(&claims).unwrap();
        assert_eq!(decode_claims(&token).unwrap(), claims);
    }
}
