// Downloader module - clip resolution and managed yt-dlp orchestration

pub mod clip;
pub mod errors;
pub mod events;
pub mod metadata;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod provisioner;
pub mod resolver;
pub mod service;
pub mod settings;

pub use clip::{ClipInfoExtractor, ClipPageFetcher};
pub use errors::DownloadError;
pub use events::ProgressEmitter;
pub use metadata::{parse_iso8601_duration, MetadataLookup};
pub use models::{
    ClipWindow, DownloadOutcome, DownloadRequest, DownloadStage, DownloaderEvent, NetworkConfig,
    ProgressEvent, RefKind, ResolvedClipInfo, ResolvedReference, StatusUpdate, VideoMetadata,
};
pub use orchestrator::{CancelToken, DownloadOrchestrator};
pub use provisioner::{ToolInstallation, ToolProvisioner};
pub use resolver::{extract_timing_hints, parse_time_param, resolve_url, TimingHints};
pub use service::{ClipDownloader, ClipRequest};
pub use settings::{SettingsStore, ToolSettings};
