//! Core types and utilities for the almacen inventory admin front end

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod entity;
pub mod error;
pub mod reports;
pub mod session;
pub mod table;
pub mod types;

/// Simple error context handling for binaries and startup code
pub mod context_error {
    use std::{error::Error as StdError, fmt};

    /// An error wrapping an optional source with a message
    #[derive(Debug)]
    pub struct ContextError {
        source: Option<Box<dyn StdError + Send + Sync>>,
        message: String,
    }

    impl ContextError {
        /// Create a new context error from a message
        pub fn new<S: Into<String>>(message: S) -> Self {
            Self {
                source: None,
                message: message.into(),
            }
        }

        /// Wrap an existing error with context
        pub fn with_context<E, S>(error: E, message: S) -> Self
        where
            E: StdError + Send + Sync + 'static,
            S: Into<String>,
        {
            Self {
                source: Some(Box::new(error)),
                message: message.into(),
            }
        }
    }

    impl fmt::Display for ContextError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match &self.source {
                Some(source) => write!(f, "{}: {source}", self.message),
                None => f.write_str(&self.message),
            }
        }
    }

    impl StdError for ContextError {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn StdError + 'static))
        }
    }

    /// Result type alias for context errors
    pub type Result<T> = std::result::Result<T, ContextError>;

    /// Create a context error from a message or format string
    #[macro_export]
    macro_rules! context_error {
        ($msg:literal) => {
            $crate::context_error::ContextError::new($msg)
        };
        ($fmt:expr, $($arg:tt)*) => {
            $crate::context_error::ContextError::new(format!($fmt, $($arg)*))
        };
    }

    /// Extension trait for adding context to results
    pub trait ResultExt<T> {
        /// Add context to an error
        ///
        /// # Errors
        ///
        /// Returns the original error wrapped with the message from `f`.
        fn with_context<F, S>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> S,
            S: Into<String>;
    }

    impl<T, E> ResultExt<T> for std::result::Result<T, E>
    where
        E: StdError + Send + Sync + 'static,
    {
        fn with_context<F, S>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> S,
            S: Into<String>,
        {
            self.map_err(|e| ContextError::with_context(e, f()))
        }
    }

    impl From<std::io::Error> for ContextError {
        fn from(err: std::io::Error) -> Self {
            Self::with_context(err, "I/O operation failed")
        }
    }

    impl From<crate::Error> for ContextError {
        fn from(err: crate::Error) -> Self {
            Self::with_context(err, "almacen error")
        }
    }

    #[cfg(test)]
    #[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
    mod tests {
        use super::*;

        #[test]
        fn test_context_wraps_source() {
            let result: std::result::Result<(), std::io::Error> =
                Err(std::io::Error::other("disk full"));
            let err = result.with_context(|| "writing log file").unwrap_err();

            assert_eq!(err.to_string(), "writing log file: disk full");
            assert!(err.source().is_some());
        }

        #[test]
        fn test_macro_formats() {
            let err = context_error!("port {} in use", 8081);
            assert_eq!(err.to_string(), "port 8081 in use");
            assert!(err.source().is_none());
        }
    }
}

// Re-export commonly used types
pub use config::Config;
pub use entity::{EntityKind, SelectOption};
pub use error::{Error, Result};
pub use session::SessionClaims;
pub use table::{PaginationMeta, SortDirection, TablePage, TableState};
pub use types::{EntityRef, Id, Record};

/// Initialize the logging system
///
/// `RUST_LOG` overrides the configured level. Logs go to the configured file,
/// or stdout when none is set.
///
/// Output goes through a non-blocking writer whose guard must be held for the
/// life of the process so buffered lines are flushed.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_logging(
    logging: &config::LoggingConfig,
) -> context_error::Result<tracing_appender::non_blocking::WorkerGuard> {
    use context_error::{ContextError, ResultExt};
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("invalid log level '{}'", logging.level))?;

    let (writer, guard) = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if logging.format.eq_ignore_ascii_case("pretty") {
        registry
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init()
    } else {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
    };
    installed.map_err(|e| ContextError::new(format!("logging already initialized: {e}")))?;

    Ok(guard)
}
