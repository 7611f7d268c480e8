use super::types::{
    DEFAULT_HOST, DEFAULT_PORT, PairupConfig, RawMatchmakingSection, RawPairupConfig,
    RawServerSection, ServerSection,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use pairup_core::CoordinatorConfig;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<PairupConfig> {
        let user_path = Self::user_config_path();
        Self::load_layers(user_path.as_deref(), &Self::project_config_path())
    }

    /// Layer the project file over the user file
    pub fn load_layers(user: Option<&Path>, project: &Path) -> Result<PairupConfig> {
        let mut raw = RawPairupConfig::default();

        // Layer 1: User config
        if let Some(user_config) = user.map(Self::read_raw).transpose()?.flatten() {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pairup").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with PAIRUP_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("PAIRUP_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".pairup/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<Option<RawPairupConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawPairupConfig, overlay: RawPairupConfig) -> RawPairupConfig {
        RawPairupConfig {
            server: RawServerSection {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            matchmaking: RawMatchmakingSection {
                grace_period_secs: overlay
                    .matchmaking
                    .grace_period_secs
                    .or(base.matchmaking.grace_period_secs),
                janitor_interval_secs: overlay
                    .matchmaking
                    .janitor_interval_secs
                    .or(base.matchmaking.janitor_interval_secs),
                match_interval_secs: overlay
                    .matchmaking
                    .match_interval_secs
                    .or(base.matchmaking.match_interval_secs),
                placeholder_name: overlay
                    .matchmaking
                    .placeholder_name
                    .or(base.matchmaking.placeholder_name),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawPairupConfig) -> PairupConfig {
        let defaults = CoordinatorConfig::default();
        PairupConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            matchmaking: CoordinatorConfig {
                grace_period_secs: raw
                    .matchmaking
                    .grace_period_secs
                    .unwrap_or(defaults.grace_period_secs),
                janitor_interval_secs: raw
                    .matchmaking
                    .janitor_interval_secs
                    .unwrap_or(defaults.janitor_interval_secs),
                match_interval_secs: raw
                    .matchmaking
                    .match_interval_secs
                    .unwrap_or(defaults.match_interval_secs),
                placeholder_name: raw
                    .matchmaking
                    .placeholder_name
                    .unwrap_or(defaults.placeholder_name),
            },
        }
    }
}
