// Common data models for the resolution and download pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What kind of reference a user-supplied URL turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    /// Direct video reference (`watch?v=` or short-link form)
    Video,
    /// Curated clip reference (`/clip/<id>`), needs page scraping
    Clip,
}

/// A classified URL with its raw identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub kind: RefKind,
    pub raw_id: String,
}

/// The `[start, end)` span of a video to extract.
///
/// `{0, 0}` is the full-video sentinel: no trimming, download everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    pub video_id: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl ClipWindow {
    pub fn new(video_id: impl Into<String>, start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            video_id: video_id.into(),
            start_seconds,
            end_seconds,
        }
    }

    /// Full-video sentinel window for the given video
    pub fn full_video(video_id: impl Into<String>) -> Self {
        Self::new(video_id, 0.0, 0.0)
    }

    pub fn is_full_video(&self) -> bool {
        self.start_seconds == 0.0 && self.end_seconds == 0.0
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// A validated download order for the orchestrator
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub window: ClipWindow,
    pub output_path: PathBuf,
}

impl DownloadRequest {
    pub fn new(window: ClipWindow, output_path: impl Into<PathBuf>) -> Self {
        Self {
            window,
            output_path: output_path.into(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.window.video_id
    }
}

/// Normalized download progress, streamed per subprocess report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: f64,
    pub downloaded_bytes: f64,
    pub total_bytes: f64,
}

/// Phase of a download request, exposed on the status channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStage {
    Extracting,
    Fetching,
    Preparing,
    Downloading,
    Completed,
    Error,
}

/// Status transition with a human-readable message for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub stage: DownloadStage,
    pub message: String,
}

impl StatusUpdate {
    pub fn new(stage: DownloadStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Everything the core emits while a request is in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DownloaderEvent {
    Status(StatusUpdate),
    Progress(ProgressEvent),
}

/// Resolved clip details returned with a finished download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedClipInfo {
    pub video_id: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub duration_seconds: f64,
    pub title: String,
    pub channel_title: String,
}

/// Terminal result of a download request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub success: bool,
    pub output_path: PathBuf,
    pub clip_info: ResolvedClipInfo,
}

/// Video details from the metadata lookup capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub duration_seconds: f64,
    pub channel_title: String,
}

/// Network configuration threaded into page fetches and yt-dlp invocations
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// SOCKS5/HTTP proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Timeout in seconds
    pub timeout: Option<u32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Some(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_video_sentinel() {
        let window = ClipWindow::full_video("abcdefghijk");
        assert!(window.is_full_video());
        assert_eq!(window.duration(), 0.0);
    }

    #[test]
    fn test_trimmed_window_is_not_sentinel() {
        let window = ClipWindow::new("abcdefghijk", 0.0, 15.0);
        assert!(!window.is_full_video());
        assert_eq!(window.duration(), 15.0);
    }
}
