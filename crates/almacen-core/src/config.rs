//! Configuration management for the almacen admin front end

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ALMACEN";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Web server configuration
    #[serde(default)]
    pub webserver: WebServerConfig,

    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Permission cache configuration
    #[serde(default)]
    pub permissions: PermissionsConfig,

    /// Table (list view) configuration
    #[serde(default)]
    pub table: TableConfig,

    /// Dashboard report configuration
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Name of the cookie holding the session token
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Path of the permission lookup endpoint
    #[serde(default = "default_permissions_path")]
    pub permissions_path: String,

    /// Path of the login endpoint
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

/// Permission cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Cache resolved permissions per role and route
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// Cache entry lifetime in seconds (0 keeps entries until invalidated)
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

/// Table (list view) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Rows per page when the request does not say
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest page size a request may ask for
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

/// Dashboard report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Inventory rows at or below this stock are reported as low
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log to file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8081
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_timeout_seconds() -> u64 {
    15
}

fn default_session_cookie() -> String {
    "token".to_string()
}

fn default_permissions_path() -> String {
    "/permisos/por-ruta".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

const fn default_cache_enabled() -> bool {
    true
}

const fn default_cache_ttl_seconds() -> u64 {
    300
}

const fn default_page_size() -> u32 {
    10
}

const fn default_max_page_size() -> u32 {
    100
}

const fn default_low_stock_threshold() -> i64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure_cookies: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            session_cookie: default_session_cookie(),
            permissions_path: default_permissions_path(),
            login_path: default_login_path(),
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl PermissionsConfig {
    /// Cache entry lifetime, `None` when entries live until invalidated
    #[must_use]
    pub const fn ttl(&self) -> Option<std::time::Duration> {
        if self.cache_ttl_seconds == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(self.cache_ttl_seconds))
        }
    }
}

impl Config {
    /// Load configuration from an optional file and the environment
    ///
    /// Without an explicit path, `almacen.toml` in the working directory is
    /// read when present. Environment variables such as
    /// `ALMACEN_API__BASE_URL` override file values.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let file_source = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("almacen").required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde defaults cannot express
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first offending setting.
    pub fn validate(&self) -> crate::Result<()> {
        let fail = |message: &str| {
            Err(crate::Error::Configuration {
                message: message.to_string(),
            })
        };

        if self.api.base_url.trim().is_empty() {
            return fail("api.base_url must not be empty");
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return fail("api.base_url must start with http:// or https://");
        }
        if self.api.session_cookie.trim().is_empty() {
            return fail("api.session_cookie must not be empty");
        }
        if self.table.default_page_size == 0 || self.table.max_page_size == 0 {
            return fail("table page sizes must be greater than zero");
        }
        if self.table.default_page_size > self.table.max_page_size {
            return fail("table.default_page_size must not exceed table.max_page_size");
        }
        Ok(())
    }

    /// Backend base URL without a trailing slash
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }
}
