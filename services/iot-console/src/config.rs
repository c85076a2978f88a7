//! Configuration types for the IoT console

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notices: NoticeConfig,
}

/// REST backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout; no timeout when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

/// Push channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_live_url")]
    pub url: String,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            url: default_live_url(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl LiveConfig {
    /// Websocket endpoint of the Socket.IO server
    pub fn endpoint(&self) -> String {
        format!(
            "{}/socket.io/?EIO=4&transport=websocket",
            self.url.trim_end_matches('/')
        )
    }
}

/// Configuration for automatic reconnection of the push channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reconnect_interval")]
    pub interval_seconds: u64,
    /// Maximum number of attempts (None for unlimited)
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_reconnect_interval(),
            max_retries: None,
        }
    }
}

/// Where the logged-in session is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

/// Notice history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeConfig {
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

fn default_live_url() -> String {
    "ws://localhost:3001".to_string()
}

fn default_true() -> bool {
    true
}

fn default_reconnect_interval() -> u64 {
    5
}

fn default_session_path() -> PathBuf {
    PathBuf::from("iot-console-session.json")
}

fn default_history_size() -> usize {
    50
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::ConsoleError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
