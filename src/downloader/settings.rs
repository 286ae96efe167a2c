// Persisted tool configuration, read at startup and written on every
// provisioning decision.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::DownloadError;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const APP_DIR_NAME: &str = "clip-downloader";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    pub binary_path: Option<PathBuf>,
    /// Unix seconds of the last completed update check
    pub last_update_check: Option<i64>,
    /// Release tag of the installed binary, when known
    pub version: Option<String>,
}

/// JSON-file-backed store for [`ToolSettings`]
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform config directory
    pub fn default_location() -> Result<Self, DownloadError> {
        let base = dirs::config_dir().ok_or_else(|| {
            DownloadError::Provision("no config directory available on this platform".to_string())
        })?;
        Ok(Self::new(base.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings document. A missing or unreadable file degrades
    /// to defaults so startup never fails on a bad settings document.
    pub fn load(&self) -> ToolSettings {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return ToolSettings::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(error) => {
                log::warn!(
                    "settings file {} is corrupt ({}), falling back to defaults",
                    self.path.display(),
                    error
                );
                ToolSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &ToolSettings) -> Result<(), DownloadError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DownloadError::Provision(format!("create settings dir: {}", e)))?;
        }
        let payload = serde_json::to_string_pretty(settings)
            .map_err(|e| DownloadError::Provision(format!("serialize settings: {}", e)))?;
        fs::write(&self.path, payload)
            .map_err(|e| DownloadError::Provision(format!("write settings: {}", e)))
    }
}
