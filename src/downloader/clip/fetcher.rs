// Clip-page fetch with manual redirect handling.
//
// The clip endpoint varies behavior by client signature, so requests
// carry a realistic browser header set. Redirects are not followed
// blindly: the new clip id is re-extracted from the Location header and
// re-fetched, capped at a fixed hop count.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, LOCATION};
use reqwest::StatusCode;

use crate::downloader::models::NetworkConfig;

pub const MAX_REDIRECT_HOPS: usize = 5;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches the public page of a clip, returning raw HTML or nothing
#[derive(Clone)]
pub struct ClipPageFetcher {
    client: reqwest::Client,
}

impl Default for ClipPageFetcher {
    fn default() -> Self {
        Self::new(&NetworkConfig::default())
    }
}

impl ClipPageFetcher {
    pub fn new(network: &NetworkConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));

        let mut builder = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(network.timeout.unwrap_or(30) as u64));

        if let Some(proxy_url) = &network.proxy {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(error) => log::warn!("ignoring invalid proxy {}: {}", proxy_url, error),
            }
        }

        let client = builder.build().unwrap_or_else(|error| {
            log::warn!("falling back to default http client: {}", error);
            reqwest::Client::new()
        });
        Self { client }
    }

    /// Fetch the page HTML for a clip id. Any transport failure or an
    /// over-long redirect chain yields `None`, signaling the caller to
    /// fall back to URL-embedded parameters or defaults.
    pub async fn fetch(&self, clip_id: &str) -> Option<String> {
        let mut current = clip_id.to_string();

        for _ in 0..=MAX_REDIRECT_HOPS {
            let url = format!("https://www.youtube.com/clip/{}", current);
            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(error) => {
                    log::warn!("clip page fetch failed for {}: {}", current, error);
                    return None;
                }
            };

            let status = response.status();
            if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
                let next = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(clip_id_from_location);
                current = next.unwrap_or(current);
                continue;
            }

            // Non-redirect responses are read as-is; the extractor decides
            // whether the body is usable.
            return response.text().await.ok();
        }

        log::warn!(
            "clip {} redirected more than {} times, giving up",
            clip_id,
            MAX_REDIRECT_HOPS
        );
        None
    }
}

/// Pull a clip id out of a redirect Location header
fn clip_id_from_location(location: &str) -> Option<String> {
    let rest = location.split("/clip/").nth(1)?;
    let id = rest.split('?').next().unwrap_or("");
    (!id.is_empty()).then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_with_absolute_url() {
        assert_eq!(
            clip_id_from_location("https://www.youtube.com/clip/UgkxNewId123"),
            Some("UgkxNewId123".to_string())
        );
    }

    #[test]
    fn test_location_strips_query() {
        assert_eq!(
            clip_id_from_location("/clip/UgkxNewId123?si=token"),
            Some("UgkxNewId123".to_string())
        );
    }

    #[test]
    fn test_location_without_clip_segment() {
        assert_eq!(clip_id_from_location("https://www.youtube.com/"), None);
        assert_eq!(clip_id_from_location("/clip/"), None);
    }
}
