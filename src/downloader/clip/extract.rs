// Clip-info extraction from scraped page HTML.
//
// The page's embedded JSON is not documented and its key spellings vary
// by build, so extraction runs ordered pattern tables with
// first-match-wins. Time patterns are tagged with their unit so
// millisecond-scale encodings normalize to seconds at the match site.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::downloader::metadata::MetadataLookup;
use crate::downloader::models::ClipWindow;
use crate::downloader::resolver::{extract_timing_hints, TimingHints};

use super::fetcher::ClipPageFetcher;

/// Scale of a matched time value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Milliseconds,
    Seconds,
}

struct TimePattern {
    regex: Regex,
    unit: TimeUnit,
}

impl TimePattern {
    fn new(pattern: &str, unit: TimeUnit) -> Self {
        Self {
            regex: Regex::new(pattern).expect("static pattern"),
            unit,
        }
    }
}

lazy_static! {
    // Ordered: most specific spelling first, raw watch-URL last
    static ref VIDEO_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#""videoId":"([a-zA-Z0-9_-]{11})""#).unwrap(),
        Regex::new(r#""video_id":"([a-zA-Z0-9_-]{11})""#).unwrap(),
        Regex::new(r"watch\?v=([a-zA-Z0-9_-]{11})").unwrap(),
        Regex::new(r#""videoDetails":\{"videoId":"([a-zA-Z0-9_-]{11})""#).unwrap(),
        Regex::new(r#"ytInitialPlayerResponse.*?"videoId":"([a-zA-Z0-9_-]{11})""#).unwrap(),
    ];
    static ref START_PATTERNS: Vec<TimePattern> = vec![
        TimePattern::new(r#""clipConfig":\{[^}]*"startTimeMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#""startTimeMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#""start_time_seconds":(\d+)"#, TimeUnit::Seconds),
        TimePattern::new(r#"startTimeMs["']?:\s*["']?(\d+)"#, TimeUnit::Milliseconds),
        TimePattern::new(r#""clipStartTimeMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#"clipStartTimeMs["']?:\s*["']?(\d+)"#, TimeUnit::Milliseconds),
        TimePattern::new(r#""startMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#"startMs["']?:\s*["']?(\d+)"#, TimeUnit::Milliseconds),
    ];
    static ref END_PATTERNS: Vec<TimePattern> = vec![
        TimePattern::new(r#""clipConfig":\{[^}]*"endTimeMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#""endTimeMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#""end_time_seconds":(\d+)"#, TimeUnit::Seconds),
        TimePattern::new(r#"endTimeMs["']?:\s*["']?(\d+)"#, TimeUnit::Milliseconds),
        TimePattern::new(r#""clipEndTimeMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#"clipEndTimeMs["']?:\s*["']?(\d+)"#, TimeUnit::Milliseconds),
        TimePattern::new(r#""endMs":"(\d+)""#, TimeUnit::Milliseconds),
        TimePattern::new(r#"endMs["']?:\s*["']?(\d+)"#, TimeUnit::Milliseconds),
    ];
}

/// Raw window values recovered from URL seeds plus page scraping,
/// before duration clamping
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScrapedWindow {
    pub video_id: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// Derives a validated clip window from a clip id and the original URL
pub struct ClipInfoExtractor {
    fetcher: ClipPageFetcher,
    metadata: Option<Arc<dyn MetadataLookup>>,
}

impl ClipInfoExtractor {
    pub fn new(fetcher: ClipPageFetcher, metadata: Option<Arc<dyn MetadataLookup>>) -> Self {
        Self { fetcher, metadata }
    }

    /// Resolve `(video_id, start, end)` for a clip. Returns `None` only
    /// when no video id can be determined at all; missing time data
    /// degrades to the 60-second default window instead of failing.
    pub async fn extract(&self, clip_id: &str, original_url: &str) -> Option<ClipWindow> {
        let hints = extract_timing_hints(original_url);
        log::debug!("url seeds for clip {}: {:?}", clip_id, hints);

        let html = self.fetcher.fetch(clip_id).await?;
        log::debug!("fetched clip page for {} ({} bytes)", clip_id, html.len());

        let scraped = match extract_from_html(&html, &hints) {
            Some(scraped) => scraped,
            None => {
                log::warn!("could not extract a video id from clip page {}", clip_id);
                return None;
            }
        };

        let duration = self.true_duration(&scraped.video_id).await;
        Some(clamp_window(scraped, duration))
    }

    /// Authoritative duration via the metadata capability, when wired up
    /// and responsive. Lookup failures degrade to unclamped defaults.
    async fn true_duration(&self, video_id: &str) -> Option<f64> {
        let lookup = self.metadata.as_ref()?;
        match lookup.video_metadata(video_id).await {
            Ok(meta) if meta.duration_seconds > 0.0 => Some(meta.duration_seconds),
            Ok(_) => None,
            Err(error) => {
                log::warn!("metadata lookup failed for {}: {}", video_id, error);
                None
            }
        }
    }
}

/// Apply the ordered pattern tables to page HTML, seeded by URL hints.
/// Page matches override seeds; the seed video id survives as a fallback.
pub(crate) fn extract_from_html(html: &str, hints: &TimingHints) -> Option<ScrapedWindow> {
    let mut video_id = hints.video_id.clone();
    for pattern in VIDEO_ID_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(html) {
            video_id = Some(caps[1].to_string());
            break;
        }
    }
    let video_id = video_id?;

    let mut start_seconds = hints.start_seconds.unwrap_or(0.0);
    let mut end_seconds = hints.end_seconds.unwrap_or(0.0);
    if let Some(start) = first_time_match(&START_PATTERNS, html) {
        start_seconds = start;
    }
    if let Some(end) = first_time_match(&END_PATTERNS, html) {
        end_seconds = end;
    }

    Some(ScrapedWindow {
        video_id,
        start_seconds,
        end_seconds,
    })
}

fn first_time_match(patterns: &[TimePattern], html: &str) -> Option<f64> {
    for pattern in patterns {
        if let Some(caps) = pattern.regex.captures(html) {
            let raw: f64 = match caps[1].parse() {
                Ok(raw) => raw,
                Err(_) => continue,
            };
            return Some(match pattern.unit {
                TimeUnit::Milliseconds => raw / 1000.0,
                TimeUnit::Seconds => raw,
            });
        }
    }
    None
}

/// Reconcile scraped values against the true video duration.
///
/// With a known duration: a missing or inverted end becomes a 60-second
/// window capped at the duration, and a start at/past the end of the
/// video relocates the whole window to the final 60 seconds. Without
/// one, only the `end == 0` default applies, unclamped.
pub(crate) fn clamp_window(scraped: ScrapedWindow, duration: Option<f64>) -> ClipWindow {
    let ScrapedWindow {
        video_id,
        mut start_seconds,
        mut end_seconds,
    } = scraped;

    match duration {
        Some(duration) => {
            if end_seconds == 0.0 || end_seconds <= start_seconds {
                end_seconds = (start_seconds + 60.0).min(duration);
            }
            if start_seconds >= duration {
                start_seconds = (duration - 60.0).max(0.0);
                end_seconds = duration;
            }
        }
        None => {
            if end_seconds == 0.0 {
                end_seconds = start_seconds + 60.0;
            }
        }
    }

    ClipWindow::new(video_id, start_seconds, end_seconds)
}
