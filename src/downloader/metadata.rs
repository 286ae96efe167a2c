// Metadata lookup boundary.
//
// The video-metadata API itself lives outside this crate; callers plug an
// implementation in behind this trait. The extractor only needs the true
// duration, the service additionally uses title/channel for status messages.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DownloadError;
use super::models::VideoMetadata;

/// Capability consumed by the clip extractor and the download service
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Fetch title, duration and channel for a video id
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, DownloadError>;
}

lazy_static! {
    static ref DURATION_RE: Regex =
        Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap();
}

/// Parse an ISO-8601-style duration (`PT#H#M#S`) into seconds.
///
/// Absent components count as 0; a malformed string parses to 0.
pub fn parse_iso8601_duration(duration: &str) -> f64 {
    let caps = match DURATION_RE.captures(duration) {
        Some(caps) => caps,
        None => return 0.0,
    };

    let component = |idx: usize| -> f64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    component(1) * 3600.0 + component(2) * 60.0 + component(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_duration() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), 3723.0);
    }

    #[test]
    fn test_minutes_only() {
        assert_eq!(parse_iso8601_duration("PT5M"), 300.0);
    }

    #[test]
    fn test_seconds_only() {
        assert_eq!(parse_iso8601_duration("PT45S"), 45.0);
    }

    #[test]
    fn test_hours_and_seconds() {
        assert_eq!(parse_iso8601_duration("PT2H30S"), 7230.0);
    }

    #[test]
    fn test_malformed_yields_zero() {
        assert_eq!(parse_iso8601_duration("not a duration"), 0.0);
        assert_eq!(parse_iso8601_duration(""), 0.0);
        assert_eq!(parse_iso8601_duration("1:02:03"), 0.0);
    }
}
