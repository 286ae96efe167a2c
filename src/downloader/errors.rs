// Error types shared across the crate

use std::fmt;

#[derive(Debug, Clone)]
pub enum DownloadError {
    /// The running platform is not one of the supported families
    UnsupportedPlatform(String),

    /// Helper-binary provisioning failed (network or storage)
    Provision(String),

    /// Operator-supplied binary path does not exist on disk
    BinaryPathMissing(String),

    /// Operation attempted before the helper binary was resolved
    NotInitialized,

    /// Input matched neither the clip nor the video URL pattern
    InvalidUrl(String),

    /// Scraping yielded no video id
    ResolutionFailed(String),

    /// Window start is not before window end
    InvalidWindow(String),

    /// Window exceeds the maximum clip duration
    DurationTooLong(f64),

    /// Window is shorter than the minimum clip duration
    DurationTooShort(f64),

    /// The helper binary exited with a non-zero code
    DownloadFailed { exit_code: i32, detail: String },

    /// The helper process could not be spawned, piped, or awaited
    Process(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPlatform(platform) => {
                write!(f, "Unsupported platform: {}", platform)
            }
            Self::Provision(cause) => write!(f, "Failed to provision yt-dlp: {}", cause),
            Self::BinaryPathMissing(path) => {
                write!(f, "Binary not found at path: {}", path)
            }
            Self::NotInitialized => write!(f, "yt-dlp not initialized"),
            Self::InvalidUrl(msg) => write!(f, "{}", msg),
            Self::ResolutionFailed(msg) => write!(f, "{}", msg),
            Self::InvalidWindow(msg) => write!(f, "{}", msg),
            Self::DurationTooLong(seconds) => write!(
                f,
                "Clip duration ({}s) exceeds maximum allowed duration of 10 minutes",
                seconds
            ),
            Self::DurationTooShort(_) => {
                write!(f, "Clip duration must be at least 1 second")
            }
            Self::DownloadFailed { exit_code, detail } => {
                if detail.is_empty() {
                    write!(f, "yt-dlp process exited with code {}", exit_code)
                } else {
                    write!(
                        f,
                        "yt-dlp process exited with code {}: {}",
                        exit_code, detail
                    )
                }
            }
            Self::Process(cause) => write!(f, "Process error: {}", cause),
        }
    }
}

impl std::error::Error for DownloadError {}
