//! Clip-aware YouTube download core.
//!
//! Resolves a user-supplied video or clip URL into a concrete
//! `(video_id, start, end)` window, then drives a managed `yt-dlp`
//! binary to materialize that window as a local MP4 while streaming
//! normalized progress and status events back to the caller.
//!
//! ```no_run
//! use std::sync::Arc;
//! use clip_downloader::{ClipDownloader, ClipRequest, ProgressEmitter, ToolProvisioner};
//!
//! # async fn run() -> Result<(), clip_downloader::DownloadError> {
//! let provisioner = Arc::new(ToolProvisioner::default_paths()?);
//! let downloader = ClipDownloader::new(provisioner, None);
//!
//! let (emitter, mut events) = ProgressEmitter::channel();
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//!
//! let request = ClipRequest {
//!     url: "https://www.youtube.com/clip/UgkxExampleClipId".to_string(),
//!     download_dir: "/tmp".into(),
//!     filename: "my-clip".to_string(),
//!     window_override: None,
//! };
//! let outcome = downloader.download_clip(&request, &emitter, None).await?;
//! println!("saved {}", outcome.output_path.display());
//! # Ok(())
//! # }
//! ```

pub mod downloader;

pub use downloader::{
    resolve_url, CancelToken, ClipDownloader, ClipInfoExtractor, ClipPageFetcher, ClipRequest,
    ClipWindow, DownloadError, DownloadOrchestrator, DownloadOutcome, DownloadRequest,
    DownloadStage, DownloaderEvent, MetadataLookup, NetworkConfig, ProgressEmitter, ProgressEvent,
    RefKind, ResolvedClipInfo, ResolvedReference, StatusUpdate, ToolInstallation, ToolProvisioner,
    VideoMetadata,
};
