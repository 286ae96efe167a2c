// Top-level download flow: URL classification, clip resolution, metadata
// enrichment and orchestrator dispatch, with status transitions emitted
// at each phase.

use std::path::PathBuf;
use std::sync::Arc;

use super::clip::{ClipInfoExtractor, ClipPageFetcher};
use super::errors::DownloadError;
use super::events::ProgressEmitter;
use super::metadata::MetadataLookup;
use super::models::{
    ClipWindow, DownloadOutcome, DownloadRequest, DownloadStage, NetworkConfig, RefKind,
    ResolvedClipInfo, VideoMetadata,
};
use super::orchestrator::{CancelToken, DownloadOrchestrator};
use super::provisioner::ToolProvisioner;
use super::resolver::resolve_url;

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_CHANNEL: &str = "Unknown Channel";

/// One download order from the caller
#[derive(Debug, Clone)]
pub struct ClipRequest {
    /// The user-supplied video or clip URL
    pub url: String,
    /// Directory the file lands in
    pub download_dir: PathBuf,
    /// Output file stem; `.mp4` is appended
    pub filename: String,
    /// Caller-chosen `(start, end)` window for direct video references.
    /// Ignored for clip references, which resolve their own window.
    pub window_override: Option<(f64, f64)>,
}

/// Facade wiring the resolution engine to the download orchestrator
pub struct ClipDownloader {
    extractor: ClipInfoExtractor,
    orchestrator: DownloadOrchestrator,
    metadata: Option<Arc<dyn MetadataLookup>>,
}

impl ClipDownloader {
    pub fn new(
        provisioner: Arc<ToolProvisioner>,
        metadata: Option<Arc<dyn MetadataLookup>>,
    ) -> Self {
        Self::with_network(provisioner, metadata, NetworkConfig::default())
    }

    pub fn with_network(
        provisioner: Arc<ToolProvisioner>,
        metadata: Option<Arc<dyn MetadataLookup>>,
        network: NetworkConfig,
    ) -> Self {
        let fetcher = ClipPageFetcher::new(&network);
        Self {
            extractor: ClipInfoExtractor::new(fetcher, metadata.clone()),
            orchestrator: DownloadOrchestrator::new(provisioner).with_network(network),
            metadata,
        }
    }

    /// Resolve the URL, derive the window, and run the download to a
    /// terminal outcome. Every failure surfaces once as an `Error`
    /// status plus the returned error; retries are the caller's call.
    pub async fn download_clip(
        &self,
        request: &ClipRequest,
        emitter: &ProgressEmitter,
        cancel: Option<&CancelToken>,
    ) -> Result<DownloadOutcome, DownloadError> {
        match self.run(request, emitter, cancel).await {
            Ok(outcome) => {
                emitter.emit_status(
                    DownloadStage::Completed,
                    format!("Saved to {}", outcome.output_path.display()),
                );
                Ok(outcome)
            }
            Err(error) => {
                emitter.emit_status(DownloadStage::Error, error.to_string());
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        request: &ClipRequest,
        emitter: &ProgressEmitter,
        cancel: Option<&CancelToken>,
    ) -> Result<DownloadOutcome, DownloadError> {
        let reference = resolve_url(&request.url)?;

        let window = match reference.kind {
            RefKind::Clip => {
                emitter.emit_status(
                    DownloadStage::Extracting,
                    "Extracting clip information...",
                );
                self.extractor
                    .extract(&reference.raw_id, &request.url)
                    .await
                    .ok_or_else(|| {
                        DownloadError::ResolutionFailed(
                            "Could not retrieve clip information. The clip may be private or deleted."
                                .to_string(),
                        )
                    })?
            }
            RefKind::Video => match request.window_override {
                Some((start, end)) => {
                    emitter.emit_status(DownloadStage::Preparing, "Preparing custom clip...");
                    ClipWindow::new(reference.raw_id.clone(), start, end)
                }
                None => {
                    emitter.emit_status(
                        DownloadStage::Preparing,
                        "Preparing full video download...",
                    );
                    ClipWindow::full_video(reference.raw_id.clone())
                }
            },
        };

        emitter.emit_status(
            DownloadStage::Fetching,
            "Fetching video details...",
        );
        let metadata = self.lookup_metadata(&window.video_id).await;

        // Validate before announcing the download, so an invalid window
        // never reaches the Downloading stage
        DownloadOrchestrator::validate_window(&window)?;

        let output_path = request.download_dir.join(format!("{}.mp4", request.filename));
        let title = metadata
            .as_ref()
            .map(|m| m.title.clone())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let channel_title = metadata
            .as_ref()
            .map(|m| m.channel_title.clone())
            .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string());

        let message = if window.is_full_video() {
            "Downloading full video...".to_string()
        } else {
            format!("Downloading clip ({:.1}s)...", window.duration())
        };
        emitter.emit_status(DownloadStage::Downloading, message);

        let download_request = DownloadRequest::new(window.clone(), output_path.clone());
        self.orchestrator
            .download(&download_request, emitter, cancel)
            .await?;

        Ok(DownloadOutcome {
            success: true,
            output_path,
            clip_info: ResolvedClipInfo {
                video_id: window.video_id.clone(),
                start_seconds: window.start_seconds,
                end_seconds: window.end_seconds,
                duration_seconds: if window.is_full_video() {
                    0.0
                } else {
                    window.duration()
                },
                title,
                channel_title,
            },
        })
    }

    async fn lookup_metadata(&self, video_id: &str) -> Option<VideoMetadata> {
        let lookup = self.metadata.as_ref()?;
        match lookup.video_metadata(video_id).await {
            Ok(metadata) => Some(metadata),
            Err(error) => {
                log::warn!("could not fetch video details for {}: {}", video_id, error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::DownloaderEvent;
    use crate::downloader::settings::SettingsStore;
    use async_trait::async_trait;

    struct FixedMetadata(VideoMetadata);

    #[async_trait]
    impl MetadataLookup for FixedMetadata {
        async fn video_metadata(&self, _video_id: &str) -> Result<VideoMetadata, DownloadError> {
            Ok(self.0.clone())
        }
    }

    fn downloader_in(dir: &std::path::Path) -> ClipDownloader {
        let store = SettingsStore::new(dir.join("settings.json"));
        let provisioner = Arc::new(ToolProvisioner::new(store, dir.join("bin")));
        ClipDownloader::new(provisioner, None)
    }

    fn drain_stages(
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<DownloaderEvent>,
    ) -> Vec<DownloadStage> {
        let mut stages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let DownloaderEvent::Status(update) = event {
                stages.push(update.stage);
            }
        }
        stages
    }

    #[tokio::test]
    async fn test_invalid_url_fails_with_error_status() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader_in(dir.path());
        let (emitter, mut rx) = ProgressEmitter::channel();

        let request = ClipRequest {
            url: "https://example.com/video".to_string(),
            download_dir: dir.path().to_path_buf(),
            filename: "clip".to_string(),
            window_override: None,
        };
        let result = downloader.download_clip(&request, &emitter, None).await;

        assert!(matches!(result, Err(DownloadError::InvalidUrl(_))));
        assert_eq!(drain_stages(&mut rx), vec![DownloadStage::Error]);
    }

    #[tokio::test]
    async fn test_inverted_override_window_is_rejected_before_downloading() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader_in(dir.path());
        let (emitter, mut rx) = ProgressEmitter::channel();

        let request = ClipRequest {
            url: "https://www.youtube.com/watch?v=abcdefghijk".to_string(),
            download_dir: dir.path().to_path_buf(),
            filename: "clip".to_string(),
            window_override: Some((10.0, 5.0)),
        };
        let result = downloader.download_clip(&request, &emitter, None).await;

        assert!(matches!(result, Err(DownloadError::InvalidWindow(_))));
        assert_eq!(
            drain_stages(&mut rx),
            vec![
                DownloadStage::Preparing,
                DownloadStage::Fetching,
                DownloadStage::Error
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_full_video_flow_with_stub_binary() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("yt-dlp-stub");
        fs::write(
            &binary,
            "#!/bin/sh\necho '[download] 100% of 4.00MiB in 00:02'\nexit 0\n",
        )
        .unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();

        let store = SettingsStore::new(dir.path().join("settings.json"));
        let provisioner = Arc::new(ToolProvisioner::new(store, dir.path().join("bin")));
        provisioner.set_binary(&binary).await.unwrap();
        let metadata = Arc::new(FixedMetadata(VideoMetadata {
            title: "Launch day".to_string(),
            duration_seconds: 300.0,
            channel_title: "Rocketry".to_string(),
        }));
        let downloader = ClipDownloader::new(provisioner, Some(metadata));

        let (emitter, mut rx) = ProgressEmitter::channel();
        let request = ClipRequest {
            url: "https://www.youtube.com/watch?v=abcdefghijk".to_string(),
            download_dir: dir.path().to_path_buf(),
            filename: "launch".to_string(),
            window_override: None,
        };
        let outcome = downloader
            .download_clip(&request, &emitter, None)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.output_path, dir.path().join("launch.mp4"));
        assert_eq!(outcome.clip_info.title, "Launch day");
        assert_eq!(outcome.clip_info.channel_title, "Rocketry");
        assert!(outcome.clip_info.start_seconds == 0.0 && outcome.clip_info.end_seconds == 0.0);

        let stages = drain_stages(&mut rx);
        assert_eq!(
            stages,
            vec![
                DownloadStage::Preparing,
                DownloadStage::Fetching,
                DownloadStage::Downloading,
                DownloadStage::Completed
            ]
        );
    }
}
