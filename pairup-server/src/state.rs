//! Shared application state for the pairup server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pairup_core::{Coordinator, CoordinatorConfig};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Matchmaking coordinator shared by every connection
    pub coordinator: Arc<Coordinator>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState with in-memory collaborators and default config
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Create a new AppState with in-memory collaborators
    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self::with_components(Arc::new(Coordinator::in_memory(config)))
    }

    /// Create AppState around an existing coordinator (for testing)
    pub fn with_components(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
