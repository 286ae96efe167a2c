// URL classification and timing-hint extraction.
//
// Two independent pattern matches decide whether an input is a direct
// video reference or a clip reference; query parameters are read
// separately as best-effort window seeds.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::errors::DownloadError;
use super::models::{RefKind, ResolvedReference};

lazy_static! {
    static ref CLIP_RE: Regex = Regex::new(r"youtube\.com/clip/([a-zA-Z0-9_-]+)").unwrap();
    static ref VIDEO_RE: Regex =
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})").unwrap();
    // Compact duration syntax: 1h2m3s, 2m10s, 90s
    static ref COMPACT_TIME_RE: Regex =
        Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").unwrap();
}

/// Classify a user-supplied URL as a clip or a direct video reference
pub fn resolve_url(url: &str) -> Result<ResolvedReference, DownloadError> {
    if let Some(caps) = CLIP_RE.captures(url) {
        return Ok(ResolvedReference {
            kind: RefKind::Clip,
            raw_id: caps[1].to_string(),
        });
    }
    if let Some(caps) = VIDEO_RE.captures(url) {
        return Ok(ResolvedReference {
            kind: RefKind::Video,
            raw_id: caps[1].to_string(),
        });
    }
    Err(DownloadError::InvalidUrl(
        "Invalid YouTube URL. Please enter a valid YouTube video or clip URL.".to_string(),
    ))
}

/// Window seeds read from a URL's query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingHints {
    pub video_id: Option<String>,
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
}

/// Best-effort read of `v`, `t`, `start` and `end` query parameters.
/// An unparseable URL yields empty hints.
pub fn extract_timing_hints(url: &str) -> TimingHints {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return TimingHints::default(),
    };

    let mut hints = TimingHints::default();
    let param = |name: &str| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(v) = param("v") {
        hints.video_id = Some(v);
    }
    if let Some(t) = param("t") {
        hints.start_seconds = Some(parse_time_param(&t));
    }
    // An explicit start parameter wins over the compact t form
    if let Some(start) = param("start") {
        hints.start_seconds = Some(start.parse().unwrap_or(0.0));
    }
    if let Some(end) = param("end") {
        hints.end_seconds = Some(end.parse().unwrap_or(0.0));
    }
    hints
}

/// Parse a `t=` style time parameter: compact `NhNmNs` syntax or a bare
/// seconds count. Unparseable input counts as 0.
pub fn parse_time_param(raw: &str) -> f64 {
    if let Some(caps) = COMPACT_TIME_RE.captures(raw) {
        let component = |idx: usize| {
            caps.get(idx)
                .and_then(|m| m.as_str().parse::<f64>().ok())
        };
        let (h, m, s) = (component(1), component(2), component(3));
        if h.is_some() || m.is_some() || s.is_some() {
            return h.unwrap_or(0.0) * 3600.0 + m.unwrap_or(0.0) * 60.0 + s.unwrap_or(0.0);
        }
    }
    raw.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url_extracts_video_id() {
        let reference = resolve_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.kind, RefKind::Video);
        assert_eq!(reference.raw_id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_short_link_extracts_same_video_id() {
        let watch = resolve_url("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        let short = resolve_url("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(watch.raw_id, short.raw_id);
        assert_eq!(short.kind, RefKind::Video);
    }

    #[test]
    fn test_clip_url_extracts_clip_id() {
        let reference =
            resolve_url("https://www.youtube.com/clip/UgkxAbCdEf-123_xyz").unwrap();
        assert_eq!(reference.kind, RefKind::Clip);
        assert_eq!(reference.raw_id, "UgkxAbCdEf-123_xyz");
    }

    #[test]
    fn test_clip_id_ignores_trailing_query() {
        let reference =
            resolve_url("https://www.youtube.com/clip/UgkxAbCdEf?si=share_token").unwrap();
        assert_eq!(reference.raw_id, "UgkxAbCdEf");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(resolve_url("https://example.com/watch?v=dQw4w9WgXcQ").is_err());
        assert!(resolve_url("not a url at all").is_err());
    }

    #[test]
    fn test_time_param_bare_seconds() {
        assert_eq!(parse_time_param("45"), 45.0);
    }

    #[test]
    fn test_time_param_seconds_suffix() {
        assert_eq!(parse_time_param("90s"), 90.0);
    }

    #[test]
    fn test_time_param_compact_syntax() {
        assert_eq!(parse_time_param("1h2m3s"), 3723.0);
        assert_eq!(parse_time_param("2m10s"), 130.0);
        assert_eq!(parse_time_param("3h"), 10800.0);
    }

    #[test]
    fn test_time_param_garbage_is_zero() {
        assert_eq!(parse_time_param("soon"), 0.0);
        assert_eq!(parse_time_param(""), 0.0);
    }

    #[test]
    fn test_timing_hints_from_query() {
        let hints = extract_timing_hints(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=90s&end=120",
        );
        assert_eq!(hints.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(hints.start_seconds, Some(90.0));
        assert_eq!(hints.end_seconds, Some(120.0));
    }

    #[test]
    fn test_start_param_overrides_t() {
        let hints =
            extract_timing_hints("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=30&start=45");
        assert_eq!(hints.start_seconds, Some(45.0));
    }

    #[test]
    fn test_unparseable_url_yields_empty_hints() {
        assert_eq!(extract_timing_hints("::::"), TimingHints::default());
    }
}
