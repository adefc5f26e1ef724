//! Application configuration management.
//!
//! `Config` is the persisted user configuration (server URL, last used
//! username, transport tuning). `ClientConfig` is the resolved set of
//! settings an `ApiClient` is built from.
//!
//! Configuration is stored at `~/.config/klokku/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "klokku";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for a CLI.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Initial backoff delay in milliseconds for rate limiting.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_username: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_rate_limit_retries: Option<u32>,
    pub session_ttl_minutes: Option<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolve the settings for an `ApiClient`. `url_override` wins over the
    /// stored base URL.
    pub fn client_config(&self, url_override: Option<&str>) -> Result<ClientConfig> {
        let base_url = url_override
            .map(str::to_string)
            .or_else(|| self.base_url.clone())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("No Klokku server URL configured (use --url or KLOKKU_URL)")
            })?;

        let mut config = ClientConfig::new(base_url);
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.max_rate_limit_retries {
            config.max_rate_limit_retries = retries;
        }
        config.session_ttl = self
            .session_ttl_minutes
            .map(session_ttl_from_minutes)
            .transpose()?;
        Ok(config)
    }
}

/// Convert a stored session lifetime into a `chrono::Duration`. Negative
/// values and values past the `Duration` range are rejected.
pub fn session_ttl_from_minutes(minutes: i64) -> Result<chrono::Duration> {
    if minutes < 0 {
        anyhow::bail!("Invalid session ttl {} minutes: must not be negative", minutes);
    }
    chrono::Duration::try_minutes(minutes)
        .ok_or_else(|| anyhow::anyhow!("Invalid session ttl {} minutes: value is too large", minutes))
}

/// Transport and session settings for an `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// 0 keeps every call at exactly one HTTP request
    pub max_rate_limit_retries: u32,
    pub initial_backoff: Duration,
    pub session_ttl: Option<chrono::Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_rate_limit_retries: 0,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            session_ttl: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit_retries(mut self, retries: u32, initial_backoff: Duration) -> Self {
        self.max_rate_limit_retries = retries;
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }
}
