//! Application state.

use std::sync::Arc;

use auth::SessionResolver;
use work_store::{WorkStore, WorkStoreError};

use crate::config::Config;
use crate::error::ServerError;
use crate::services::MonotonicClock;

/// Shared application state.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Work item store.
    pub store: Arc<dyn WorkStore>,
    /// Session backend used by the identity middleware.
    pub sessions: Arc<dyn SessionResolver>,
    /// Source of `createdAt` values.
    pub clock: MonotonicClock,
}

impl AppState {
    /// Creates new application state.
    pub fn new(
        config: Config,
        store: Arc<dyn WorkStore>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            config,
            store,
            sessions,
            clock: MonotonicClock::new(),
        }
    }

    /// Logs a store failure and turns it into a 500.
    pub fn store_failure(&self, e: WorkStoreError) -> ServerError {
        tracing::error!(error = %e, "Work store operation failed");
        ServerError::Internal {
            detail: e.to_string(),
            expose: self.config.expose_error_details,
        }
    }
}

/// Type alias for shared state.
pub type SharedState = Arc<AppState>;
