//! Hotpatch Configuration Module
//! Handles loading and validating hotpatch.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::platform::Platform;

pub const CONFIG_FILE_NAME: &str = "hotpatch.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub update: UpdateConfig,
    #[serde(default)]
    pub hotfix: HotfixConfig,
}

/// Orchestrator policy and UI pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// False in editor/tool contexts; every check then reports no change.
    pub checks_enabled: bool,
    pub hotfixing_enabled: bool,
    pub block_on_initial_load: bool,
    /// How long a successful result may be replayed instead of re-checked.
    pub cache_ttl_ms: u64,
    /// Pause before announcing completion of a full check.
    pub check_complete_delay_ms: u64,
    /// Pause before announcing completion of an availability-only check.
    pub availability_complete_delay_ms: u64,
    /// Pause before replaying a cached result.
    pub cached_response_delay_ms: u64,
    pub preload_poll_interval_ms: u64,
    pub controller_id: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            checks_enabled: true,
            hotfixing_enabled: true,
            block_on_initial_load: true,
            cache_ttl_ms: 30_000,
            check_complete_delay_ms: 500,
            availability_complete_delay_ms: 100,
            cached_response_delay_ms: 100,
            preload_poll_interval_ms: 16,
            controller_id: 0,
        }
    }
}

impl UpdateConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn check_complete_delay(&self) -> Duration {
        Duration::from_millis(self.check_complete_delay_ms)
    }

    pub fn availability_complete_delay(&self) -> Duration {
        Duration::from_millis(self.availability_complete_delay_ms)
    }

    pub fn cached_response_delay(&self) -> Duration {
        Duration::from_millis(self.cached_response_delay_ms)
    }

    pub fn preload_poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.preload_poll_interval_ms.max(1))
    }
}

/// Which remote files count as hotfix content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotfixConfig {
    /// Prefix every platform-specific file name starts with, e.g. `Linux_`.
    pub platform_prefix: String,
    pub locale: String,
    pub config_extension: String,
    pub archive_extension: String,
    /// Appended to the locale to form the one localization file we accept.
    pub localization_suffix: String,
}

impl Default for HotfixConfig {
    fn default() -> Self {
        Self {
            platform_prefix: format!("{}_", Platform::current().name()),
            locale: "en".to_string(),
            config_extension: "ini".to_string(),
            archive_extension: "pak".to_string(),
            localization_suffix: "_Game.locres".to_string(),
        }
    }
}

impl HotfixConfig {
    /// File name of the localization resource for the configured locale.
    pub fn localization_file_name(&self) -> String {
        format!("{}{}", self.locale, self.localization_suffix)
    }
}

impl Config {
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load the config if present, otherwise fall back to defaults.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        match Self::load(dir) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, dir: &Path) -> Result<(), ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}
