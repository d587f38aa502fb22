//! Console configuration
//!
//! Loaded from `~/.config/dedup-cli/config.toml` (or an explicit path), with
//! environment overrides applied on top. Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "DEDUP_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, without the `/api` suffix
    pub base_url: String,
    /// Per-request timeout; processing calls can take minutes on large files
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 300,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Fan-out settings for cross-system auto-population
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum source systems fetched at the same time
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { max_concurrent: 8 }
    }
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or from the default location when `None`
    ///
    /// A missing file at the default location is not an error; a missing
    /// explicit path is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::from_toml_str(&content)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    log::debug!("Loading config from {}", path.display());
                    let content = std::fs::read_to_string(&path).with_context(|| {
                        format!("Failed to read config file: {}", path.display())
                    })?;
                    Self::from_toml_str(&content)?
                }
                _ => Self::default(),
            },
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                log::debug!("Using backend URL from {}: {}", API_URL_ENV, url);
                self.api.base_url = url.trim().to_string();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url cannot be empty");
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            );
        }
        if self.fetch.max_concurrent == 0 {
            anyhow::bail!("fetch.max_concurrent must be at least 1");
        }
        Ok(())
    }
}

/// `~/.config/dedup-cli/config.toml` on Linux, platform equivalent elsewhere
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dedup-cli").join("config.toml"))
}
