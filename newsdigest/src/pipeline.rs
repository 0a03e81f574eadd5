//! The two summarization use cases, independent of the HTTP layer.
//!
//! Everything runs sequentially inside the calling request: fetch, extract,
//! then one LLM call per article in feed order.

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use common::Config;

use crate::extraction::{ContentExtractor, ExtractError, ExtractionSettings};
use crate::ingestion::FeedReader;
use crate::llm::summarizer::Summarizer;
use crate::llm::LlmProvider;
use crate::models::{ArticleRef, SummaryBatch, SummaryResult};
use crate::scraping::{FetchError, PageFetcher, DEFAULT_FETCH_TIMEOUT_SECS};

pub const RSS_SUCCESS_MESSAGE: &str = "RSS Summaries generated successfully!";
pub const RSS_EMPTY_MESSAGE: &str = "No articles found or fetched from the provided RSS feed.";
pub const ARTICLE_SUCCESS_MESSAGE: &str = "Article summary generated successfully!";

/// Client-facing failures; all map to HTTP 400 with the display text as detail.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Could not fetch RSS feed: {0}")]
    Feed(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("{0}")]
    Invalid(String),
}

pub struct SummaryPipeline {
    pub feeds: FeedReader,
    pub pages: PageFetcher,
    pub extractor: ContentExtractor,
    pub summarizer: Summarizer,
}

impl SummaryPipeline {
    /// Wire the components from configuration around an already-initialized provider.
    pub fn from_config(config: &Config, provider: Arc<dyn LlmProvider>) -> anyhow::Result<Self> {
        let page_timeout = config.fetch.timeout_seconds.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        let feed_timeout = config.fetch.feed_timeout_seconds.unwrap_or(page_timeout);

        let extractor = ContentExtractor::new(ExtractionSettings::from_config(config.extraction.as_ref()))
            .context("invalid [extraction] configuration")?;

        Ok(Self {
            feeds: FeedReader::new(feed_timeout)?,
            pages: PageFetcher::new(page_timeout, config.fetch.user_agent.as_deref())?,
            extractor,
            summarizer: Summarizer::new(provider),
        })
    }

    pub async fn summarize_rss(&self, feed_url: &str, limit: usize) -> Result<SummaryBatch, RequestError> {
        if limit == 0 {
            return Err(RequestError::Invalid("num_articles must be at least 1".to_string()));
        }
        info!("pipeline: summarizing up to {} articles from {}", limit, feed_url);

        let articles = self
            .feeds
            .fetch(feed_url, limit)
            .await
            .map_err(|e| {
                warn!("pipeline: feed fetch failed for {}: {:#}", feed_url, e);
                RequestError::Feed(format!("{:#}", e))
            })?;

        if articles.is_empty() {
            return Ok(SummaryBatch {
                message: RSS_EMPTY_MESSAGE.to_string(),
                summaries: Vec::new(),
            });
        }

        let mut summaries = Vec::with_capacity(articles.len());
        for article in articles {
            summaries.push(self.summarize_ref(article).await);
        }

        let ok = summaries.iter().filter(|s| s.is_success()).count();
        info!("pipeline: summarized {} RSS articles ({} successful)", summaries.len(), ok);

        Ok(SummaryBatch {
            message: RSS_SUCCESS_MESSAGE.to_string(),
            summaries,
        })
    }

    pub async fn summarize_article(&self, article_url: &str) -> Result<SummaryBatch, RequestError> {
        info!("pipeline: summarizing single article {}", article_url);

        let html = self.pages.fetch(article_url).await?;
        let text = self.extractor.extract(&html).map_err(|e| {
            warn!("pipeline: extraction failed for {}: {}", article_url, e);
            e
        })?;

        let article = ArticleRef {
            title: self.resolve_title(article_url).await,
            link: article_url.to_string(),
            content: text,
        };
        let result = self.summarize_ref(article).await;
        if !result.is_success() {
            warn!("pipeline: summary for {} is a failure message", article_url);
        }

        Ok(SummaryBatch {
            message: ARTICLE_SUCCESS_MESSAGE.to_string(),
            summaries: vec![result],
        })
    }

    async fn summarize_ref(&self, article: ArticleRef) -> SummaryResult {
        SummaryResult {
            summary: self.summarizer.summary_text(&article.content).await,
            title: article.title,
            link: article.link,
        }
    }

    /// Reads `<title>` from a fresh fetch of the page, falling back to a synthetic title.
    async fn resolve_title(&self, url: &str) -> String {
        match self.pages.fetch(url).await {
            Ok(html) => {
                if let Some(title) = self.extractor.extract_title(&html) {
                    return title;
                }
                warn!("pipeline: no <title> in {}", url);
            }
            Err(e) => warn!("pipeline: title fetch failed for {}: {}", url, e),
        }
        format!("Summary of: {}", url)
    }
}
