use serde::{Deserialize, Serialize};

use crate::llm::summarizer::{AI_ERROR_PREFIX, TOO_SHORT_MESSAGE};

/// Number of feed entries summarized when the request does not say.
pub const DEFAULT_NUM_ARTICLES: usize = 5;

/// Substrings the legacy API used to flag failures inside plain text values.
pub const FAILURE_MARKERS: [&str; 3] = ["Could not extract", "Error fetching", "Failed to generate summary"];

/// Legacy substring check. Legitimate article text can contain these phrases,
/// so this is only meant for compatibility checks on API output.
pub fn has_failure_marker(text: &str) -> bool {
    FAILURE_MARKERS.iter().any(|marker| text.contains(marker))
}

/// An article as handed to the summarizer: raw feed summary or extracted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    pub title: String,
    pub link: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub title: String,
    pub link: String,
    pub summary: String,
}

impl SummaryResult {
    /// False when `summary` holds one of the summarizer's failure texts.
    pub fn is_success(&self) -> bool {
        self.summary != TOO_SHORT_MESSAGE && !self.summary.starts_with(AI_ERROR_PREFIX)
    }
}

/// Success body of both summarize routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryBatch {
    pub message: String,
    pub summaries: Vec<SummaryResult>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRssRequest {
    pub rss_url: String,
    #[serde(default = "default_num_articles")]
    pub num_articles: usize,
}

fn default_num_articles() -> usize {
    DEFAULT_NUM_ARTICLES
}

#[derive(Debug, Deserialize)]
pub struct SummarizeArticleRequest {
    pub article_url: String,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(summary: &str) -> SummaryResult {
        SummaryResult {
            title: "t".into(),
            link: "https://example.com".into(),
            summary: summary.into(),
        }
    }

    #[test]
    fn sentinel_summaries_are_not_successful() {
        assert!(result_with("A real summary of the article.").is_success());
        assert!(!result_with("Content too short or empty to summarize.").is_success());
        assert!(!result_with("Failed to generate summary due to an AI error: boom").is_success());
    }

    #[test]
    fn failure_markers() {
        assert!(has_failure_marker("Could not extract meaningful content from the URL."));
        assert!(has_failure_marker("Error fetching article: the page was not found (404)."));
        assert!(!has_failure_marker("The council approved the budget."));
    }

    #[test]
    fn rss_request_defaults_num_articles() {
        let req: SummarizeRssRequest =
            serde_json::from_str(r#"{"rss_url": "https://example.com/rss"}"#).expect("parse");
        assert_eq!(req.num_articles, DEFAULT_NUM_ARTICLES);
    }
}
