use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::models::AiConfig;

const APP_NAME: &str = "scriptorium";
const CONFIG_FILE: &str = "config.json";

/// Default port for the local HTTP API.
pub const DEFAULT_PORT: u16 = 17020;

/// Where uploads land when no folder is given and the library already has folders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadFallback {
    /// Append to the first existing folder.
    #[default]
    FirstFolder,
    /// Append to the folder named "Uploads", creating it if needed.
    UploadsFolder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the workspace database. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    /// Quiet period after the last edit before ghost text is requested.
    pub ghost_delay_ms: u64,
    pub upload_fallback: UploadFallback,
    /// Largest single value the store accepts, emulating a browser storage quota.
    pub storage_quota_bytes: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            port: DEFAULT_PORT,
            ghost_delay_ms: 2000,
            upload_fallback: UploadFallback::FirstFolder,
            storage_quota_bytes: Some(5 * 1024 * 1024),
        }
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides. Returns defaults if the file doesn't exist or
    /// fails to parse.
    pub fn load() -> Self {
        let config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("SCRIPTORIUM_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(port) = std::env::var("SCRIPTORIUM_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.port = port;
        }
        self
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn ghost_delay(&self) -> Duration {
        Duration::from_millis(self.ghost_delay_ms)
    }
}

/// API key from the environment, used when none is stored.
pub fn api_key_from_env() -> Option<String> {
    std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Stored AI settings with the environment key filled in when none is stored.
pub fn effective_ai_config(stored: &AiConfig) -> AiConfig {
    with_fallback_key(stored, api_key_from_env())
}

fn with_fallback_key(stored: &AiConfig, fallback: Option<String>) -> AiConfig {
    let mut config = stored.clone();
    if !config.has_key() {
        if let Some(key) = fallback {
            config.api_key = key;
        }
    }
    config
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
