//! Application state management

use almacen_client::{ApiClient, PermissionProvider, SubmitGuard};
use almacen_core::{Config, Result};
use std::{sync::Arc, time::Instant};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Backend client without a session bound
    pub client: ApiClient,
    /// Cached permission resolver shared by every request
    pub permissions: Arc<PermissionProvider>,
    /// Creates still in flight
    pub submissions: Arc<SubmitGuard>,
    /// When the service started
    pub started_at: Instant,
}

impl AppState {
    /// Create application state from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let client = ApiClient::from_config(&config.api)?;
        let permissions = Arc::new(PermissionProvider::from_config(&config.permissions));

        Ok(Self {
            config,
            client,
            permissions,
            submissions: Arc::new(SubmitGuard::new()),
            started_at: Instant::now(),
        })
    }

    /// Backend client that forwards `token` as the session credential
    #[must_use]
    pub fn client_for(&self, token: &str) -> ApiClient {
        self.client.with_session_token(token)
    }

    /// Seconds since the service started
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
