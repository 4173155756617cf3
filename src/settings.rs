//! Persisted user settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    /// Name associated with uploads. Remembered from the last upload so the
    /// user does not have to retype it.
    pub user_name: Option<String>,
    /// Per-user opt-out consulted alongside the `[notify]` config; editing
    /// the settings file silences desktop notifications without touching
    /// the shared config.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            user_name: None,
            notifications_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Settings with their backing store; saved explicitly after changes.
pub struct SettingsStore {
    path: PathBuf,
    pub settings: UserSettings,
}

impl SettingsStore {
    pub fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            settings: store::load_or_default(path),
        }
    }

    pub fn set_user_name(&mut self, name: &str) -> Result<()> {
        self.settings.user_name = Some(name.to_string());
        store::save(&self.path, &self.settings)
    }
}
