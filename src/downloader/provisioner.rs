// Managed yt-dlp lifecycle: locate, download, version-check and persist
// the helper binary used for the actual media fetch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::process::Command;
use tokio::sync::Mutex;

use super::errors::DownloadError;
use super::settings::{SettingsStore, ToolSettings, APP_DIR_NAME};

/// Update checks run at most once per week
pub const UPDATE_CHECK_INTERVAL_SECS: i64 = 7 * 24 * 60 * 60;

const RELEASE_DOWNLOAD_BASE: &str = "https://github.com/yt-dlp/yt-dlp/releases/latest/download";
const LATEST_RELEASE_API: &str = "https://api.github.com/repos/yt-dlp/yt-dlp/releases/latest";

/// A resolved helper-binary installation
#[derive(Debug, Clone)]
pub struct ToolInstallation {
    pub binary_path: PathBuf,
    pub version: Option<String>,
    pub last_checked_at: Option<i64>,
}

/// Release asset name for the running platform
pub fn platform_asset() -> Result<&'static str, DownloadError> {
    if cfg!(target_os = "windows") {
        Ok("yt-dlp.exe")
    } else if cfg!(target_os = "macos") {
        Ok("yt-dlp_macos")
    } else if cfg!(target_os = "linux") {
        Ok("yt-dlp")
    } else {
        Err(DownloadError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}

/// Whether enough time has passed since the last completed check
pub(crate) fn update_check_due(last_check: Option<i64>, now: i64) -> bool {
    match last_check {
        Some(last) => now - last > UPDATE_CHECK_INTERVAL_SECS,
        None => true,
    }
}

/// Provisioner for the managed yt-dlp binary.
///
/// All state transitions run under one async mutex, so two concurrent
/// callers cannot race a download onto the same install path. Construct
/// once at startup and share by reference.
pub struct ToolProvisioner {
    store: SettingsStore,
    install_dir: PathBuf,
    client: reqwest::Client,
    state: Mutex<Option<ToolInstallation>>,
}

impl ToolProvisioner {
    pub fn new(store: SettingsStore, install_dir: impl Into<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("clip-downloader/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            store,
            install_dir: install_dir.into(),
            client,
            state: Mutex::new(None),
        }
    }

    /// Provisioner rooted at the platform data/config directories
    pub fn default_paths() -> Result<Self, DownloadError> {
        let data = dirs::data_dir().ok_or_else(|| {
            DownloadError::Provision("no data directory available on this platform".to_string())
        })?;
        Ok(Self::new(
            SettingsStore::default_location()?,
            data.join(APP_DIR_NAME).join("binaries"),
        ))
    }

    /// Resolve a usable binary: a persisted path wins when it still
    /// exists, then the default install location, otherwise a fresh
    /// download. Managed installations get an opportunistic update
    /// check whose failures are logged and swallowed; an operator
    /// override bypasses auto-provisioning entirely.
    pub async fn resolve_binary(&self) -> Result<ToolInstallation, DownloadError> {
        let mut state = self.state.lock().await;
        let settings = self.store.load();
        let managed_path = platform_asset()
            .ok()
            .map(|asset| self.install_dir.join(asset));

        let existing = settings
            .binary_path
            .as_ref()
            .filter(|path| path.is_file())
            .cloned()
            .or_else(|| managed_path.clone().filter(|path| path.is_file()));

        if let Some(binary_path) = existing {
            let managed = managed_path.as_deref() == Some(binary_path.as_path());
            let mut installation = ToolInstallation {
                binary_path,
                version: settings.version.clone(),
                last_checked_at: settings.last_update_check,
            };
            *state = Some(installation.clone());
            if managed {
                self.check_for_update_locked(&mut state).await;
                if let Some(updated) = state.as_ref() {
                    installation = updated.clone();
                }
            }
            return Ok(installation);
        }

        log::info!("yt-dlp binary not found, downloading");
        self.download_locked(&mut state, None).await
    }

    /// Force a re-download of the latest release
    pub async fn download(&self) -> Result<ToolInstallation, DownloadError> {
        let mut state = self.state.lock().await;
        let version = match self.latest_release_tag().await {
            Ok(tag) => Some(tag),
            Err(error) => {
                log::warn!("could not read latest release tag: {}", error);
                None
            }
        };
        self.download_locked(&mut state, version).await
    }

    /// Best-effort weekly update check. Never fails: any error here is
    /// logged and the existing binary stays in use.
    pub async fn check_for_update(&self) {
        let mut state = self.state.lock().await;
        self.check_for_update_locked(&mut state).await;
    }

    /// Accept an operator-supplied binary path, bypassing provisioning.
    /// The path must exist on disk; otherwise the current installation
    /// is left untouched.
    pub async fn set_binary(&self, path: impl AsRef<Path>) -> Result<(), DownloadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DownloadError::BinaryPathMissing(
                path.display().to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        let mut settings = self.store.load();
        settings.binary_path = Some(path.to_path_buf());
        self.store.save(&settings)?;
        *state = Some(ToolInstallation {
            binary_path: path.to_path_buf(),
            version: settings.version,
            last_checked_at: settings.last_update_check,
        });
        Ok(())
    }

    /// Self-reported version of the resolved binary
    pub async fn get_version(&self) -> Result<String, DownloadError> {
        let state = self.state.lock().await;
        let installation = state.as_ref().ok_or(DownloadError::NotInitialized)?;

        let output = Command::new(&installation.binary_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| DownloadError::Process(format!("yt-dlp --version: {}", e)))?;
        if !output.status.success() {
            return Err(DownloadError::Process(
                "yt-dlp --version exited with an error".to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Currently resolved binary path, if any
    pub async fn binary_path(&self) -> Option<PathBuf> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|installation| installation.binary_path.clone())
    }

    async fn check_for_update_locked(&self, state: &mut Option<ToolInstallation>) {
        let settings = self.store.load();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if !update_check_due(settings.last_update_check, now) {
            return;
        }

        log::info!("checking for yt-dlp updates");
        let latest = match self.latest_release_tag().await {
            Ok(tag) => tag,
            Err(error) => {
                log::warn!("yt-dlp update check failed: {}", error);
                return;
            }
        };

        if settings.version.as_deref() == Some(latest.as_str()) {
            let refreshed = ToolSettings {
                last_update_check: Some(now),
                ..settings
            };
            if let Err(error) = self.store.save(&refreshed) {
                log::warn!("could not persist update-check timestamp: {}", error);
            }
            if let Some(installation) = state.as_mut() {
                installation.last_checked_at = Some(now);
            }
            return;
        }

        log::info!(
            "updating yt-dlp from {} to {}",
            settings.version.as_deref().unwrap_or("unknown"),
            latest
        );
        if let Err(error) = self.download_locked(state, Some(latest)).await {
            log::warn!("yt-dlp update failed: {}", error);
        }
    }

    async fn download_locked(
        &self,
        state: &mut Option<ToolInstallation>,
        version: Option<String>,
    ) -> Result<ToolInstallation, DownloadError> {
        let asset = platform_asset()?;
        fs::create_dir_all(&self.install_dir)
            .map_err(|e| DownloadError::Provision(format!("create install dir: {}", e)))?;
        let target = self.install_dir.join(asset);
        let url = format!("{}/{}", RELEASE_DOWNLOAD_BASE, asset);

        log::info!("downloading yt-dlp from {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DownloadError::Provision(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DownloadError::Provision(format!(
                "release download returned HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Provision(e.to_string()))?;

        // Stage next to the target and rename so a half-written file
        // never becomes the active binary.
        let staging = target.with_extension("tmp");
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|e| DownloadError::Provision(format!("write binary: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&staging, fs::Permissions::from_mode(0o755))
                .map_err(|e| DownloadError::Provision(format!("set permissions: {}", e)))?;
        }

        tokio::fs::rename(&staging, &target)
            .await
            .map_err(|e| DownloadError::Provision(format!("install binary: {}", e)))?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut settings = self.store.load();
        settings.binary_path = Some(target.clone());
        settings.last_update_check = Some(now);
        if version.is_some() {
            settings.version = version;
        }
        self.store.save(&settings)?;

        let installation = ToolInstallation {
            binary_path: target,
            version: settings.version,
            last_checked_at: Some(now),
        };
        *state = Some(installation.clone());
        log::info!("yt-dlp installed at {}", installation.binary_path.display());
        Ok(installation)
    }

    async fn latest_release_tag(&self) -> Result<String, DownloadError> {
        let json: serde_json::Value = self
            .client
            .get(LATEST_RELEASE_API)
            .send()
            .await
            .map_err(|e| DownloadError::Provision(e.to_string()))?
            .json()
            .await
            .map_err(|e| DownloadError::Provision(e.to_string()))?;
        json["tag_name"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                DownloadError::Provision("release feed carried no tag_name".to_string())
            })
    }
}
