use anyhow::{Context, Result};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use crate::models::ArticleRef;

const NO_TITLE: &str = "No Title";
const NO_LINK: &str = "No Link";

/// Downloads and parses RSS/Atom feeds.
#[derive(Clone)]
pub struct FeedReader {
    client: Client,
}

impl FeedReader {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("newsdigest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { client })
    }

    /// Fetches the feed at `url` and returns at most `limit` entries in feed order.
    /// A single attempt; network, status and parse failures are all returned as errors.
    pub async fn fetch(&self, url: &str, limit: usize) -> Result<Vec<ArticleRef>> {
        let response = self.client.get(url).send().await.context("network error during fetch")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("feed fetch failed with status: {}", status);
        }

        let bytes = response.bytes().await.context("failed to read response body")?;
        let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;
        info!("ingestion: feed '{}' has {} entries, taking up to {}", url, feed.entries.len(), limit);

        Ok(feed.entries.iter().take(limit).map(article_from_entry).collect())
    }
}

/// Maps a feed entry to an [`ArticleRef`], preferring the entry summary over
/// full content and media descriptions.
pub fn article_from_entry(entry: &Entry) -> ArticleRef {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| NO_LINK.to_string());

    let content = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .filter(|c| !c.trim().is_empty())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()).filter(|b| !b.trim().is_empty()))
        .or_else(|| {
            entry
                .media
                .iter()
                .find_map(|m| m.description.as_ref().map(|d| d.content.clone()))
                .filter(|d| !d.trim().is_empty())
        })
        .unwrap_or_default();

    ArticleRef { title, link, content }
}
