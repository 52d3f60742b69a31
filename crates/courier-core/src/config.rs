//! Client configuration.
//!
//! `ClientConfig` is the immutable configuration object an `ApiClient` is
//! built from. `Config` holds the optional user settings persisted at
//! `~/.config/courier/config.json` that are layered over the environment
//! defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::environment::Environment;

/// Application name used for config/data directory paths
const APP_NAME: &str = "courier";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// What to do with a failure that produced no response while the client is offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfflinePolicy {
    /// Swallow the failure; the call resolves with no payload
    #[default]
    Resolve,
    /// Reject with `ApiError::Offline`
    Reject,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub with_credentials: bool,
    pub offline_policy: OfflinePolicy,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            base_url: environment.base_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
            with_credentials: true,
            offline_policy: OfflinePolicy::default(),
            user_agent: format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    pub fn with_offline_policy(mut self, policy: OfflinePolicy) -> Self {
        self.offline_policy = policy;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub environment: Option<Environment>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub offline_policy: Option<OfflinePolicy>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `COURIER_ENV` wins over the config file; development is the fallback.
    pub fn resolve_environment(&self) -> Environment {
        Environment::from_env()
            .or(self.environment)
            .unwrap_or_default()
    }

    /// Layer the persisted overrides over the defaults for `environment`.
    pub fn client_config(&self, environment: Environment) -> ClientConfig {
        let mut config = ClientConfig::for_environment(environment);
        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(policy) = self.offline_policy {
            config.offline_policy = policy;
        }
        config
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed key-value storage
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::for_environment(Environment::Test);
        assert_eq!(config.base_url, "http://192.168.20.12:8080");
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert!(config.with_credentials);
        assert_eq!(config.offline_policy, OfflinePolicy::Resolve);
        assert!(config.user_agent.starts_with("courier/"));
    }

    #[test]
    fn test_overrides_layer_over_environment() {
        let config = Config {
            environment: None,
            base_url: Some("http://localhost:9999".to_string()),
            timeout_ms: Some(2500),
            offline_policy: Some(OfflinePolicy::Reject),
        };
        let client = config.client_config(Environment::Production);
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.timeout, Duration::from_millis(2500));
        assert_eq!(client.offline_policy, OfflinePolicy::Reject);

        let plain = Config::default().client_config(Environment::Production);
        assert_eq!(plain.base_url, "http://api.zhufengpeixun.cn");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("nope.json")).expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            environment: Some(Environment::Test),
            base_url: None,
            timeout_ms: Some(500),
            offline_policy: None,
        };
        config.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not json").expect("write");
        assert!(Config::load_from(&path).is_err());
    }
}
