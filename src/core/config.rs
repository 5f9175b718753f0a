use anyhow::{Context, Result};
use chrono::TimeDelta;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::providers::frankfurter::DEFAULT_BASE_URL;

/// Environment variable holding the quote API key; overrides the config file.
pub const API_KEY_ENV: &str = "UNITCONV_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl ProviderConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Exchange rates older than this many seconds are refreshed on use.
    pub refresh_after_secs: Option<u64>,
}

impl AppConfig {
    /// Loads `path` when given, else the default config file if it exists, else defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Maximum rate age from `refresh_after_secs`, if set and representable.
    pub fn max_rate_age(&self) -> Result<Option<TimeDelta>> {
        self.refresh_after_secs
            .map(|secs| {
                i64::try_from(secs)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .with_context(|| format!("{secs} seconds is out of range"))
                    .context("Invalid refresh_after_secs")
            })
            .transpose()
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "unitconv", "unitconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .max_rate_age()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
