//! Error types for the almacen admin front end

use std::{error::Error as StdError, fmt};

/// Main error type for the almacen admin front end
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// The backend could not be reached
    Transport(String),

    /// Timeout error
    Timeout {
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// The backend answered with a non-success status
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Not found error
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Authentication error
    Authentication(String),

    /// The current role lacks a capability on a route
    Forbidden {
        /// Permission route that was checked
        ruta: String,
        /// Capability that was required
        capability: String,
    },

    /// An identical create is already in flight
    DuplicateSubmission {
        /// Resource being created
        resource: String,
    },

    /// Session token could not be decoded
    InvalidToken(String),

    /// Serialization error
    Serialization(serde_json::Error),

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether this error means the backend was unreachable or too slow,
    /// as opposed to an authoritative answer
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
            || matches!(self, Self::Http { status, .. } if *status >= 500)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::Transport(msg) => write!(f, "Backend unreachable: {msg}"),
            Self::Timeout { duration_ms } => {
                write!(f, "Operation timed out after {duration_ms}ms")
            }
            Self::Http { status, message } => write!(f, "Backend returned {status}: {message}"),
            Self::NotFound { resource } => write!(f, "Resource not found: {resource}"),
            Self::Authentication(msg) => write!(f, "Authentication failed: {msg}"),
            Self::Forbidden { ruta, capability } => {
                write!(f, "Permission denied: {capability} on {ruta}")
            }
            Self::DuplicateSubmission { resource } => {
                write!(f, "Duplicate submission for {resource}")
            }
            Self::InvalidToken(msg) => write!(f, "Invalid session token: {msg}"),
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

// From implementations for automatic conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.first() {
            Some((field, details)) => {
                let message = details
                    .first()
                    .and_then(|detail| detail.message.as_ref().map(ToString::to_string))
                    .or_else(|| details.first().map(|detail| detail.code.to_string()))
                    .unwrap_or_else(|| "invalid value".to_string());
                Self::validation(field.to_string(), message)
            }
            None => Self::validation("payload", "invalid value"),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_panics_doc,
    clippy::uninlined_format_args,
    clippy::unwrap_used,
    clippy::panic
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;
    use validator::Validate;

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_error = Error::from(io_error);

        match app_error {
            Error::Io(_) => {}
            _ => panic!("Expected Io error variant"),
        }

        assert!(format!("{}", app_error).contains("I/O error"));
        assert!(app_error.source().is_some());
    }

    #[test]
    fn test_validation_error() {
        let error = Error::validation("nombre", "Field is required");

        assert_eq!(
            format!("{}", error),
            "Validation error: nombre - Field is required"
        );
    }

    #[test]
    fn test_forbidden_error() {
        let error = Error::Forbidden {
            ruta: "/admin/areas".to_string(),
            capability: "eliminar".to_string(),
        };

        assert_eq!(
            format!("{}", error),
            "Permission denied: eliminar on /admin/areas"
        );
    }

    #[test]
    fn test_not_found_error() {
        let error = Error::not_found("areas/42");
        assert_eq!(format!("{}", error), "Resource not found: areas/42");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>(r#"{"invalid": json}"#)
            .unwrap_err();
        let app_error = Error::from(json_error);

        assert!(matches!(app_error, Error::Serialization(_)));
        assert!(app_error.source().is_some());
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Transport("connection refused".to_string()).is_transient());
        assert!(Error::Timeout { duration_ms: 100 }.is_transient());
        assert!(
            Error::Http {
                status: 503,
                message: "down".to_string()
            }
            .is_transient()
        );
        assert!(
            !Error::Http {
                status: 400,
                message: "bad".to_string()
            }
            .is_transient()
        );
        assert!(!Error::not_found("x").is_transient());
    }

    #[test]
    fn test_validation_errors_conversion() {
        #[derive(Validate)]
        struct Form {
            #[validate(length(min = 1, message = "el nombre es obligatorio"))]
            nombre: String,
        }

        let errors = Form {
            nombre: String::new(),
        }
        .validate()
        .unwrap_err();

        match Error::from(errors) {
            Error::Validation { field, message } => {
                assert_eq!(field, "nombre");
                assert_eq!(message, "el nombre es obligatorio");
            }
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_all_error_display_variants() {
        let test_cases = vec![
            (Error::Io(io::Error::other("test")), "I/O error:"),
            (
                Error::Configuration {
                    message: "config error".to_string(),
                },
                "Configuration error: config error",
            ),
            (
                Error::Transport("refused".to_string()),
                "Backend unreachable: refused",
            ),
            (
                Error::Http {
                    status: 500,
                    message: "boom".to_string(),
                },
                "Backend returned 500: boom",
            ),
            (
                Error::Authentication("expired".to_string()),
                "Authentication failed: expired",
            ),
            (
                Error::DuplicateSubmission {
                    resource: "areas".to_string(),
                },
                "Duplicate submission for areas",
            ),
            (
                Error::InvalidToken("bad segment".to_string()),
                "Invalid session token: bad segment",
            ),
            (Error::Other("other error".to_string()), "other error"),
        ];

        for (error, expected_contains) in test_cases {
            let display_str = format!("{}", error);
            assert!(
                display_str.contains(expected_contains),
                "Error display '{}' should contain '{}'",
                display_str,
                expected_contains
            );
        }
    }
}
