// Progress-stream normalization.
//
// yt-dlp reports progress in heterogeneous shapes: percent as a raw float
// or a string with a `%` suffix, sizes as byte counts or human-readable
// strings ("10MB", "343.72MiB"). Everything is normalized into one
// canonical ProgressEvent immediately at this boundary.

use lazy_static::lazy_static;
use regex::Regex;

use super::models::ProgressEvent;

lazy_static! {
    // Example: [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32
    static ref PROGRESS_RE: Regex = Regex::new(
        r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*[A-Za-z]+)"
    )
    .unwrap();
    static ref SIZE_RE: Regex =
        Regex::new(r"^(\d+\.?\d*)\s*([KkMmGgTt]?)(?:i?[Bb])?$").unwrap();
}

/// Parse a percent value, with or without a trailing `%`
pub fn parse_percent(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse().ok()
}

/// Parse a size into bytes: bare byte counts and human-readable strings
/// ("10MB", "343.72MiB", "1.5GiB"). Binary multipliers for both the `MiB`
/// and `MB` spellings, matching yt-dlp's own output convention.
pub fn parse_size_bytes(raw: &str) -> Option<f64> {
    let caps = SIZE_RE.captures(raw.trim())?;
    let value: f64 = caps[1].parse().ok()?;
    let multiplier = match caps[2].to_ascii_uppercase().as_str() {
        "" => 1.0,
        "K" => 1024.0,
        "M" => 1024.0 * 1024.0,
        "G" => 1024.0 * 1024.0 * 1024.0,
        "T" => 1024.0f64.powi(4),
        _ => return None,
    };
    Some(value * multiplier)
}

/// Build a canonical event from a percent and total-size report. The
/// downloaded count is derived from the percent fraction.
pub fn normalize_progress(percent_raw: &str, total_raw: &str) -> Option<ProgressEvent> {
    let percent = parse_percent(percent_raw)?;
    let total_bytes = parse_size_bytes(total_raw).unwrap_or(0.0);
    Some(ProgressEvent {
        percent,
        downloaded_bytes: percent / 100.0 * total_bytes,
        total_bytes,
    })
}

/// Parse one yt-dlp stdout line into a progress event, if it is one
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_RE.captures(line)?;
    normalize_progress(&caps[1], &caps[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_with_suffix() {
        assert_eq!(parse_percent("42.5%"), Some(42.5));
    }

    #[test]
    fn test_percent_bare_float() {
        assert_eq!(parse_percent("42.5"), Some(42.5));
        assert_eq!(parse_percent(" 100 "), Some(100.0));
    }

    #[test]
    fn test_size_decimal_spelling() {
        assert_eq!(parse_size_bytes("10MB"), Some(10_485_760.0));
    }

    #[test]
    fn test_size_binary_spelling() {
        assert_eq!(parse_size_bytes("343.72MiB"), Some(343.72 * 1024.0 * 1024.0));
        assert_eq!(parse_size_bytes("1.5GiB"), Some(1.5 * 1024.0 * 1024.0 * 1024.0));
    }

    #[test]
    fn test_size_bare_bytes() {
        assert_eq!(parse_size_bytes("2048"), Some(2048.0));
        assert_eq!(parse_size_bytes("512KiB"), Some(524_288.0));
    }

    #[test]
    fn test_size_garbage_is_none() {
        assert_eq!(parse_size_bytes("unknown"), None);
        assert_eq!(parse_size_bytes("12XB"), None);
    }

    #[test]
    fn test_normalize_derives_downloaded_bytes() {
        let event = normalize_progress("42.5%", "10MB").unwrap();
        assert_eq!(event.percent, 42.5);
        assert_eq!(event.total_bytes, 10_485_760.0);
        assert!((event.downloaded_bytes - 0.425 * 10_485_760.0).abs() < 1.0);
    }

    #[test]
    fn test_parse_download_line() {
        let line = "[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(event.percent, 6.2);
        assert!((event.total_bytes - 343.72 * 1024.0 * 1024.0).abs() < 1.0);
    }

    #[test]
    fn test_non_progress_lines_are_skipped() {
        assert!(parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage").is_none());
        assert!(parse_progress_line("[download] Destination: clip.mp4").is_none());
    }

    #[test]
    fn test_unknown_total_still_reports_percent() {
        let event = normalize_progress("12.5", "N/A");
        let event = event.unwrap();
        assert_eq!(event.percent, 12.5);
        assert_eq!(event.total_bytes, 0.0);
        assert_eq!(event.downloaded_bytes, 0.0);
    }
}
