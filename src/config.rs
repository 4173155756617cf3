use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub assistant: Option<AssistantConfig>,
    pub storage: StorageConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the JSON record stores (upload history, user
    /// settings, activity log). Created on first use.
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    /// Probe cadence for the content store, in seconds.
    #[serde(default = "default_store_interval_secs")]
    pub store_interval_secs: u64,
    /// Probe cadence for the assistant backend, in seconds.
    #[serde(default = "default_assistant_interval_secs")]
    pub assistant_interval_secs: u64,
    /// Bound on each individual probe request, in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            store_interval_secs: default_store_interval_secs(),
            assistant_interval_secs: default_assistant_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Default on-screen lifetime for native notifications, in seconds.
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}
fn default_store_interval_secs() -> u64 {
    4
}
fn default_assistant_interval_secs() -> u64 {
    30
}
fn default_probe_timeout_secs() -> u64 {
    3
}
fn default_notify_timeout_secs() -> u64 {
    3
}
fn default_true() -> bool {
    true
}

impl Config {
    pub fn history_path(&self) -> PathBuf {
        self.storage.data_dir.join("upload_history.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.storage.data_dir.join("user_settings.json")
    }

    pub fn activity_path(&self) -> PathBuf {
        self.storage.data_dir.join("activity_log.json")
    }

    pub fn notification_log_path(&self) -> PathBuf {
        self.storage.data_dir.join("notifications.log")
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.remote.base_url.is_empty() {
        anyhow::bail!("remote.base_url must not be empty");
    }
    if config.remote.request_timeout_secs == 0 {
        anyhow::bail!("remote.request_timeout_secs must be > 0");
    }

    if let Some(assistant) = &config.assistant {
        if assistant.base_url.is_empty() {
            anyhow::bail!("assistant.base_url must not be empty");
        }
    }

    if config.health.store_interval_secs == 0 || config.health.assistant_interval_secs == 0 {
        anyhow::bail!("health probe intervals must be > 0");
    }
    if config.health.probe_timeout_secs == 0 {
        anyhow::bail!("health.probe_timeout_secs must be > 0");
    }

    Ok(config)
}
