//! Coordinator configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default grace period before a dropped participant's session ends
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 10;

/// Default interval between queue janitor sweeps
pub const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 5;

/// Default interval of the safety-net match pass
pub const DEFAULT_MATCH_INTERVAL_SECS: u64 = 2;

/// Display name used when the profile lookup fails
pub const DEFAULT_PLACEHOLDER_NAME: &str = "Anonymous";

/// Tunables for the matchmaking coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub grace_period_secs: u64,
    pub janitor_interval_secs: u64,
    pub match_interval_secs: u64,
    pub placeholder_name: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            janitor_interval_secs: DEFAULT_JANITOR_INTERVAL_SECS,
            match_interval_secs: DEFAULT_MATCH_INTERVAL_SECS,
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
        }
    }
}

impl CoordinatorConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    /// Never zero; `tokio::time::interval` panics on a zero period
    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs.max(1))
    }

    pub fn match_interval(&self) -> Duration {
        Duration::from_secs(self.match_interval_secs.max(1))
    }
}
