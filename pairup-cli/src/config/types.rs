use pairup_core::CoordinatorConfig;
use serde::{Deserialize, Serialize};

/// Default host for the pairup server
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the pairup server
pub const DEFAULT_PORT: u16 = 7433;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPairupConfig {
    #[serde(default)]
    pub server: RawServerSection,

    #[serde(default)]
    pub matchmaking: RawMatchmakingSection,
}

/// Server section as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Matchmaking tunables as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMatchmakingSection {
    /// Seconds a dropped participant may take to reconnect
    pub grace_period_secs: Option<u64>,
    pub janitor_interval_secs: Option<u64>,
    pub match_interval_secs: Option<u64>,
    /// Display name used when a profile lookup fails
    pub placeholder_name: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PairupConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub matchmaking: CoordinatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Host address to bind to
    pub host: String,

    /// Port for the pairup server
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl PairupConfig {
    /// Server settings ready to hand to [`pairup_server::PairupServer`]
    pub fn server_config(&self) -> pairup_server::ServerConfig {
        pairup_server::ServerConfig::new(self.server.host.clone(), self.server.port)
            .with_coordinator(self.matchmaking.clone())
    }
}
