//! Application configuration management.
//!
//! `Config` is the persisted file (origin, last username, client tuning) at
//! `~/.config/optica/config.json`. `ClientConfig` is the resolved, typed
//! configuration the API client is built from.
//!
//! Resolution order: built-in defaults, then the config file, then
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "optica";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Origin used when neither the config file nor the environment names one.
/// Matches the backend's development server.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Path the backend mounts its API under, relative to the site origin
const API_PATH: &str = "/api";

pub const ENV_ORIGIN: &str = "OPTICA_ORIGIN";
pub const ENV_API_URL: &str = "OPTICA_API_URL";

/// Retry/timeout/cache knobs as stored on disk. Units are in the field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientTuning {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub retry_multiplier: u32,
    pub timeout_ms: u64,
    pub cache_timeout_secs: u64,
    /// How long past its TTL a cached GET may still answer for an
    /// unreachable backend
    pub stale_retention_secs: u64,
    pub cache_max_entries: usize,
    pub health_check_interval_secs: u64,
    pub health_check_timeout_ms: u64,
    /// Recognise "database unavailable" from message text when the backend
    /// sends no error code.
    pub legacy_error_markers: bool,
}

impl Default for ClientTuning {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            retry_multiplier: 2,
            timeout_ms: 10_000,
            cache_timeout_secs: 5 * 60,
            stale_retention_secs: 30 * 60,
            cache_max_entries: 256,
            health_check_interval_secs: 30,
            health_check_timeout_ms: 5_000,
            legacy_error_markers: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Site origin, e.g. `https://opticacentral.com.br`
    pub origin: Option<String>,
    /// Full API base URL; wins over `origin` when set
    pub api_url: Option<String>,
    pub last_username: Option<String>,
    /// Seal the offline snapshot with a passphrase
    #[serde(default)]
    pub encrypt_snapshot: bool,
    #[serde(default)]
    pub client: ClientTuning,
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origin) = lookup(ENV_ORIGIN).filter(|v| !v.trim().is_empty()) {
            self.origin = Some(origin);
        }
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = Some(url);
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// API base URL: `api_url` if set, otherwise derived from the origin.
    pub fn base_url(&self) -> String {
        match self.api_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => api_url_for_origin(self.origin.as_deref().unwrap_or(DEFAULT_ORIGIN)),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::from_tuning(self.base_url(), &self.client)
    }
}

/// `https://shop.example/` -> `https://shop.example/api`
pub fn api_url_for_origin(origin: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), API_PATH)
}

/// Resolved configuration for `ApiClient`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Wait before the first retry
    pub retry_delay: Duration,
    pub retry_multiplier: u32,
    /// Bound on each individual attempt
    pub timeout: Duration,
    pub cache_timeout: Duration,
    pub stale_retention: Duration,
    pub cache_max_entries: usize,
    pub health_check_interval: Duration,
    pub health_check_timeout: Duration,
    pub legacy_error_markers: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_origin(DEFAULT_ORIGIN)
    }
}

impl ClientConfig {
    pub fn for_origin(origin: &str) -> Self {
        Self::from_tuning(api_url_for_origin(origin), &ClientTuning::default())
    }

    pub fn from_tuning(base_url: String, tuning: &ClientTuning) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: tuning.max_retries,
            retry_delay: Duration::from_millis(tuning.retry_delay_ms),
            retry_multiplier: tuning.retry_multiplier.max(1),
            timeout: Duration::from_millis(tuning.timeout_ms),
            cache_timeout: Duration::from_secs(tuning.cache_timeout_secs),
            stale_retention: Duration::from_secs(tuning.stale_retention_secs),
            cache_max_entries: tuning.cache_max_entries.max(1),
            health_check_interval: Duration::from_secs(tuning.health_check_interval_secs.max(1)),
            health_check_timeout: Duration::from_millis(tuning.health_check_timeout_ms),
            legacy_error_markers: tuning.legacy_error_markers,
        }
    }

    /// Delay after the failed attempt with 0-based index `attempt`:
    /// `retry_delay * retry_multiplier^attempt`, saturating.
    pub fn retry_delay_for(&self, attempt: u32) -> Duration {
        let factor = self.retry_multiplier.saturating_pow(attempt);
        self.retry_delay.saturating_mul(factor)
    }

    /// Join an endpoint path (`/products`) onto the base URL.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}
