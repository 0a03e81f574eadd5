// Summarizer module
use std::sync::Arc;
use tracing::{info, warn};

use super::{LlmProvider, LlmRequest};

/// Minimum trimmed length (in characters) worth sending to the model.
pub const MIN_SUMMARY_INPUT_CHARS: usize = 50;

pub const TOO_SHORT_MESSAGE: &str = "Content too short or empty to summarize.";
pub const AI_ERROR_PREFIX: &str = "Failed to generate summary due to an AI error:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizeError {
    #[error("Content too short or empty to summarize.")]
    TooShort,
    #[error("Failed to generate summary due to an AI error: {0}")]
    Ai(String),
}

/// Prompt sent for every article; the text is embedded verbatim.
pub fn render_prompt(text: &str) -> String {
    format!(
        r#"Summarize the following news article concisely and clearly.
Focus on the main points and key information.
Keep the summary to a maximum of 3-5 sentences.

Article:
{}

Summary:
"#,
        text
    )
}

/// Wraps the process-wide LLM provider with the summarization prompt.
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// One LLM call per invocation; inputs under the minimum length never reach the model.
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if text.trim().chars().count() < MIN_SUMMARY_INPUT_CHARS {
            return Err(SummarizeError::TooShort);
        }

        match self.provider.generate(LlmRequest::new(render_prompt(text))).await {
            Ok(response) => {
                info!(
                    "LLM summarization successful ({}): {} chars, {} tokens",
                    response.model,
                    response.content.len(),
                    response.usage.total_tokens
                );
                Ok(response.content.trim().to_string())
            }
            Err(e) => {
                warn!("LLM summarization failed: {:#}", e);
                Err(SummarizeError::Ai(format!("{:#}", e)))
            }
        }
    }

    /// Summary text for a result row: the model reply, or the failure message inline.
    pub async fn summary_text(&self, text: &str) -> String {
        match self.summarize(text).await {
            Ok(summary) => summary,
            Err(e) => e.to_string(),
        }
    }
}
