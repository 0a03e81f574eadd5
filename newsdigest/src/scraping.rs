use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Host suffix of a search engine and the homepage sent as its Referer.
const SEARCH_ENGINE_REFERERS: &[(&str, &str)] = &[
    ("google.com", "https://www.google.com/"),
    ("bing.com", "https://www.bing.com/"),
    ("duckduckgo.com", "https://duckduckgo.com/"),
    ("yahoo.com", "https://search.yahoo.com/"),
    ("baidu.com", "https://www.baidu.com/"),
    ("yandex.com", "https://yandex.com/"),
    ("yandex.ru", "https://yandex.ru/"),
];

/// Why an article page could not be fetched. Every message starts with
/// "Error fetching" so API clients keep recognizing it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Error fetching article: the page was not found (404).")]
    NotFound,
    #[error("Error fetching article: access was forbidden (403). The website might be blocking automated access.")]
    Forbidden,
    #[error("Error fetching article: the server responded with status {0}.")]
    Status(u16),
    #[error("Error fetching article: the request timed out after {0} seconds.")]
    Timeout(u64),
    #[error("Error fetching article: {0}")]
    Transport(String),
    #[error("Error fetching article: invalid URL ({0}).")]
    InvalidUrl(String),
}

/// Downloads article pages with browser-like headers.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    timeout_secs: u64,
}

impl PageFetcher {
    pub fn new(timeout_secs: u64, user_agent: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent.unwrap_or(BROWSER_USER_AGENT))
            .default_headers(browser_headers())
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { client, timeout_secs })
    }

    /// One GET of `url`; returns the body text on 2xx.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = parse_page_url(url)?;

        let response = self
            .client
            .get(parsed.clone())
            .header(header::REFERER, referer_for(&parsed))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("scraping: {} answered {}", url, status);
            return Err(match status {
                StatusCode::NOT_FOUND => FetchError::NotFound,
                StatusCode::FORBIDDEN => FetchError::Forbidden,
                other => FetchError::Status(other.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        info!("scraping: fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

fn parse_page_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers
}

/// Referer sent with a page request: the page itself, or the homepage of the
/// search engine when the page lives on one.
pub fn referer_for(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    SEARCH_ENGINE_REFERERS
        .iter()
        .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{}", suffix)))
        .map(|(_, homepage)| homepage.to_string())
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referer(url: &str) -> String {
        referer_for(&Url::parse(url).expect("url"))
    }

    #[test]
    fn referer_is_the_page_itself() {
        assert_eq!(
            referer("https://www.nytimes.com/2024/01/01/world/story.html"),
            "https://www.nytimes.com/2024/01/01/world/story.html"
        );
    }

    #[test]
    fn search_engines_get_their_homepage() {
        assert_eq!(referer("https://news.google.com/articles/abc"), "https://www.google.com/");
        assert_eq!(referer("https://www.bing.com/news?q=x"), "https://www.bing.com/");
        assert_eq!(referer("https://duckduckgo.com/?q=rust"), "https://duckduckgo.com/");
        // Only real subdomains match
        assert_eq!(referer("https://notgoogle.com/a"), "https://notgoogle.com/a");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(parse_page_url("ftp://example.com/a"), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(parse_page_url("not a url"), Err(FetchError::InvalidUrl(_))));
        assert!(parse_page_url(" https://example.com/a ").is_ok());
    }

    #[test]
    fn messages_keep_legacy_marker() {
        for err in [
            FetchError::NotFound,
            FetchError::Forbidden,
            FetchError::Status(500),
            FetchError::Timeout(15),
            FetchError::Transport("connection reset".into()),
        ] {
            assert!(err.to_string().starts_with("Error fetching"));
        }
        assert!(FetchError::NotFound.to_string().contains("404"));
        assert!(FetchError::Forbidden.to_string().contains("403"));
    }
}
