//! # Client Configuration
//!
//! Configuration management for bigdataops-client library and CLI.
//! Supports environment variables, config files, and command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Client configuration for API connections and health monitoring
///
/// # Examples
///
/// ```rust
/// use bigdataops_client::config::ClientConfig;
///
/// // Default configuration
/// let config = ClientConfig::default();
/// assert_eq!(config.api.base_url, "http://localhost:8000/api");
/// assert_eq!(config.api.timeout_ms, 8000);
/// assert_eq!(config.health.interval_secs, 30);
/// ```
///
/// ```rust,no_run
/// use bigdataops_client::config::ClientConfig;
///
/// // Load configuration from environment and config files
/// let config = ClientConfig::load().expect("Failed to load config");
/// println!("API URL: {}", config.api.base_url);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Platform API configuration
    pub api: ApiEndpointConfig,
    /// Backend liveness probe configuration
    pub health: HealthCheckConfig,
    /// Path for the persisted session file; in-memory session only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
}

/// API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpointConfig {
    /// Base URL for the API root (e.g., "<http://localhost:8000/api>")
    pub base_url: String,
    /// Per-request deadline in milliseconds
    pub timeout_ms: u64,
}

/// Liveness probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Health endpoint path relative to the API root
    pub path: String,
    /// Seconds between scheduled probes
    pub interval_secs: u64,
    /// Hard deadline per probe in milliseconds
    pub probe_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiEndpointConfig {
                base_url: "http://localhost:8000/api".to_string(),
                timeout_ms: 8000,
            },
            health: HealthCheckConfig {
                path: "/health".to_string(),
                interval_secs: 30,
                probe_timeout_ms: 3000,
            },
            session_file: None,
        }
    }
}

impl ApiEndpointConfig {
    /// Per-request deadline as a [`Duration`]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl HealthCheckConfig {
    /// Interval between scheduled probes as a [`Duration`]
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Hard per-probe deadline as a [`Duration`]
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl ClientConfig {
    /// Load configuration from environment variables and config file
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (~/.bigdataops/config.toml)
    /// 3. Default values
    pub fn load() -> ApiResult<Self> {
        let mut config = Self::default();

        // Try to load from config file
        if let Some(config_path) = Self::find_config_file() {
            debug!("Loading config from: {}", config_path.display());
            match Self::load_from_file(&config_path) {
                Ok(file_config) => config = file_config,
                Err(e) => {
                    debug!("Failed to load config file: {}", e);
                    // Continue with defaults if config file fails
                }
            }
        }

        // Override with environment variables
        config.apply_env_overrides();

        debug!("Loaded client configuration: {:?}", config);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ApiError::config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let possible_paths: [&Path; 4] = [
            // Current directory
            Path::new("./bigdataops.toml"),
            Path::new("./config/bigdataops.toml"),
            // User home directory
            &dirs::home_dir()?.join(".bigdataops").join("config.toml"),
            &dirs::config_dir()?.join("bigdataops").join("client.toml"),
        ];

        for path in &possible_paths {
            if path.exists() && path.is_file() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BIGDATAOPS_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(timeout) = std::env::var("BIGDATAOPS_API_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(timeout_ms) => self.api.timeout_ms = timeout_ms,
                Err(e) => warn!("Ignoring invalid BIGDATAOPS_API_TIMEOUT_MS: {}", e),
            }
        }
        if let Ok(interval) = std::env::var("BIGDATAOPS_HEALTH_INTERVAL_SECS") {
            match interval.parse() {
                Ok(interval_secs) => self.health.interval_secs = interval_secs,
                Err(e) => warn!("Ignoring invalid BIGDATAOPS_HEALTH_INTERVAL_SECS: {}", e),
            }
        }
        if let Ok(timeout) = std::env::var("BIGDATAOPS_HEALTH_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(timeout_ms) => self.health.probe_timeout_ms = timeout_ms,
                Err(e) => warn!("Ignoring invalid BIGDATAOPS_HEALTH_TIMEOUT_MS: {}", e),
            }
        }
        if let Ok(path) = std::env::var("BIGDATAOPS_SESSION_FILE") {
            self.session_file = Some(PathBuf::from(path));
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> ApiResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ApiError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ApiError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get default config file path
    pub fn default_config_path() -> ApiResult<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| ApiError::config("Could not determine home directory"))?;

        Ok(home_dir.join(".bigdataops").join("config.toml"))
    }

    /// Get default session file path, next to the config file
    pub fn default_session_path() -> ApiResult<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| ApiError::config("Could not determine home directory"))?;

        Ok(home_dir.join(".bigdataops").join("session.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_ms, 8000);
        assert_eq!(config.health.path, "/health");
        assert_eq!(config.health.interval_secs, 30);
        assert_eq!(config.health.probe_timeout_ms, 3000);
        assert!(config.session_file.is_none());
    }

    #[test]
    fn test_duration_accessors() {
        let config = ClientConfig::default();
        assert_eq!(config.api.timeout(), Duration::from_secs(8));
        assert_eq!(config.health.interval(), Duration::from_secs(30));
        assert_eq!(config.health.probe_timeout(), Duration::from_millis(3000));
    }

    #[test]
    fn test_config_serialization() {
        let config = ClientConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: ClientConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.api.base_url, deserialized.api.base_url);
        assert_eq!(config.health.interval_secs, deserialized.health.interval_secs);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test-config.toml");

        let original_config = ClientConfig::default();
        original_config.save_to_file(&config_path).unwrap();

        let loaded_config = ClientConfig::load_from_file(&config_path).unwrap();
        assert_eq!(original_config.api.base_url, loaded_config.api.base_url);
        assert_eq!(
            original_config.health.probe_timeout_ms,
            loaded_config.health.probe_timeout_ms
        );
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let err = ClientConfig::load_from_file(&missing).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_env_overrides_win_and_bad_values_are_ignored() {
        // No other test reads these variables, so this cannot race
        std::env::set_var("BIGDATAOPS_API_URL", "http://ops.internal:9000/api");
        std::env::set_var("BIGDATAOPS_API_TIMEOUT_MS", "not-a-number");
        std::env::set_var("BIGDATAOPS_HEALTH_INTERVAL_SECS", "5");

        let mut config = ClientConfig::default();
        config.apply_env_overrides();

        std::env::remove_var("BIGDATAOPS_API_URL");
        std::env::remove_var("BIGDATAOPS_API_TIMEOUT_MS");
        std::env::remove_var("BIGDATAOPS_HEALTH_INTERVAL_SECS");

        assert_eq!(config.api.base_url, "http://ops.internal:9000/api");
        // Unparseable override leaves the default in place
        assert_eq!(config.api.timeout_ms, 8000);
        assert_eq!(config.health.interval_secs, 5);
    }
}
