//! Configuration management for Gramcast

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Facebook app id, sent with every request
    pub app_id: String,

    /// Graph API version segment, e.g. "v23.0"
    #[serde(default = "default_api_version")]
    pub version: String,

    /// File holding the long-lived access token
    pub token_file: String,

    /// Override the API host (proxies, test servers)
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the queue and history JSON files
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Seconds between queue polls
    pub poll_interval: u64,

    /// Publish attempts per queue entry before it is dropped
    pub max_attempts: u32,

    /// Seconds to pause after a failed publish before moving on
    pub retry_delay: u64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            poll_interval: 60,
            max_attempts: 3,
            retry_delay: 10,
        }
    }
}

fn default_api_version() -> String {
    "v23.0".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig {
                app_id: String::new(),
                version: default_api_version(),
                token_file: "~/.config/gramcast/graph.token".to_string(),
                base_url: None,
            },
            store: StoreConfig {
                dir: "~/.local/share/gramcast".to_string(),
            },
            scheduling: SchedulingConfig::default(),
        }
    }

    /// Resolve the store directory with `~` expansion
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.dir).to_string())
    }

    /// Resolve the access token.
    ///
    /// `GRAMCAST_TOKEN` takes precedence over the configured token file.
    pub fn access_token(&self) -> Result<SecretString> {
        if let Ok(token) = std::env::var("GRAMCAST_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(SecretString::from(token));
            }
        }

        let token_path = shellexpand::tilde(&self.api.token_file).to_string();
        let token = std::fs::read_to_string(&token_path)
            .map_err(|e| {
                ConfigError::MissingToken(format!("cannot read {}: {}", token_path, e))
            })?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(ConfigError::MissingToken(format!("{} is empty", token_path)).into());
        }

        Ok(SecretString::from(token))
    }
}

/// Resolve the configuration file path following the XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("GRAMCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("gramcast").join("config.toml"))
}

/// Resolve the default data directory path
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("gramcast"))
}
