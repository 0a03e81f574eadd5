//! Article body extraction
//!
//! Finds the readable text of a news page with an ordered cascade of CSS
//! selectors. The first selector whose element yields long-enough `<p>` text
//! wins; if nothing usable comes out, every paragraph of the page is scanned
//! instead, minus common boilerplate lines.

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use common::ExtractionConfig;

/// Most specific containers first.
const DEFAULT_RULES: &[&str] = &[
    "[itemprop=\"articleBody\"]",
    "[data-testid=\"article-body\"]",
    ".article-body",
    ".article__body",
    ".article-content",
    ".story-body",
    ".entry-content",
    ".post-content",
    ".td-post-content",
    "article",
    "main",
    "[role=\"main\"]",
    "#article-body",
    "#content",
    "#main-content",
];

const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 50;
const DEFAULT_MIN_ARTICLE_CHARS: usize = 100;
const DEFAULT_BOILERPLATE_PREFIXES: &[&str] = &["read more", "comments", "share this"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not extract meaningful content from the URL.")]
    NotEnoughContent,
}

/// One step of the cascade: a container selector and the minimum paragraph
/// length (in characters, after trimming) counted inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRule {
    pub selector: String,
    pub min_paragraph_chars: usize,
}

impl SelectorRule {
    pub fn new(selector: impl Into<String>, min_paragraph_chars: usize) -> Self {
        Self {
            selector: selector.into(),
            min_paragraph_chars,
        }
    }
}

/// Tunables of the heuristic.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub rules: Vec<SelectorRule>,
    pub fallback_min_paragraph_chars: usize,
    /// The final text must be strictly longer than this
    pub min_article_chars: usize,
    /// Matched case-insensitively against the start of each fallback paragraph
    pub boilerplate_prefixes: Vec<String>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|s| SelectorRule::new(*s, DEFAULT_MIN_PARAGRAPH_CHARS))
                .collect(),
            fallback_min_paragraph_chars: DEFAULT_MIN_PARAGRAPH_CHARS,
            min_article_chars: DEFAULT_MIN_ARTICLE_CHARS,
            boilerplate_prefixes: DEFAULT_BOILERPLATE_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExtractionSettings {
    /// Apply the `[extraction]` config section on top of the defaults.
    pub fn from_config(cfg: Option<&ExtractionConfig>) -> Self {
        let mut settings = Self::default();
        let Some(cfg) = cfg else {
            return settings;
        };

        if !cfg.rules.is_empty() {
            settings.rules = cfg
                .rules
                .iter()
                .map(|r| {
                    SelectorRule::new(
                        r.selector.clone(),
                        r.min_paragraph_chars.unwrap_or(DEFAULT_MIN_PARAGRAPH_CHARS),
                    )
                })
                .collect();
        }
        if let Some(n) = cfg.fallback_min_paragraph_chars {
            settings.fallback_min_paragraph_chars = n;
        }
        if let Some(n) = cfg.min_article_chars {
            settings.min_article_chars = n;
        }
        if let Some(prefixes) = &cfg.boilerplate_prefixes {
            settings.boilerplate_prefixes = prefixes.clone();
        }
        settings
    }
}

struct CompiledRule {
    source: String,
    selector: Selector,
    min_paragraph_chars: usize,
}

/// Compiled form of [`ExtractionSettings`], built once at startup and shared.
pub struct ContentExtractor {
    rules: Vec<CompiledRule>,
    paragraph: Selector,
    title: Selector,
    fallback_min_paragraph_chars: usize,
    min_article_chars: usize,
    boilerplate_prefixes: Vec<String>,
}

impl ContentExtractor {
    /// Compile the selector cascade. Fails on the first invalid CSS selector.
    pub fn new(settings: ExtractionSettings) -> Result<Self> {
        let rules = settings
            .rules
            .into_iter()
            .map(|rule| {
                Ok(CompiledRule {
                    selector: parse_selector(&rule.selector)?,
                    source: rule.selector,
                    min_paragraph_chars: rule.min_paragraph_chars,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            paragraph: parse_selector("p")?,
            title: parse_selector("title")?,
            fallback_min_paragraph_chars: settings.fallback_min_paragraph_chars,
            min_article_chars: settings.min_article_chars,
            boilerplate_prefixes: settings
                .boilerplate_prefixes
                .into_iter()
                .map(|p| p.to_lowercase())
                .collect(),
        })
    }

    /// Extractor with the built-in cascade.
    pub fn standard() -> Result<Self> {
        Self::new(ExtractionSettings::default())
    }

    /// Best-effort plain-text article body of `html`.
    pub fn extract(&self, html: &str) -> Result<String, ExtractError> {
        let document = Html::parse_document(html);

        let text = match self.primary_block(&document) {
            Some(block) if block.chars().count() >= self.min_article_chars => block,
            Some(block) => {
                debug!(chars = block.chars().count(), "extraction: cascade block too short, scanning whole page");
                self.fallback_block(&document)
            }
            None => {
                debug!("extraction: no selector matched usable paragraphs, scanning whole page");
                self.fallback_block(&document)
            }
        };

        let normalized = normalize_whitespace(&text);
        if normalized.chars().count() > self.min_article_chars {
            Ok(normalized)
        } else {
            Err(ExtractError::NotEnoughContent)
        }
    }

    /// Trimmed text of the document `<title>`, if any.
    pub fn extract_title(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.title)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn primary_block(&self, document: &Html) -> Option<String> {
        for rule in &self.rules {
            let Some(container) = document.select(&rule.selector).next() else {
                continue;
            };
            let paragraphs: Vec<String> = self
                .paragraphs(container)
                .filter(|p| p.chars().count() > rule.min_paragraph_chars)
                .collect();
            if !paragraphs.is_empty() {
                debug!(selector = %rule.source, paragraphs = paragraphs.len(), "extraction: selector matched");
                return Some(paragraphs.join("\n"));
            }
        }
        None
    }

    fn fallback_block(&self, document: &Html) -> String {
        self.paragraphs(document.root_element())
            .filter(|p| p.chars().count() > self.fallback_min_paragraph_chars)
            .filter(|p| !self.is_boilerplate(p))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn paragraphs<'a>(&'a self, scope: ElementRef<'a>) -> impl Iterator<Item = String> + 'a {
        scope
            .select(&self.paragraph)
            .map(|p| p.text().collect::<String>().trim().to_string())
    }

    fn is_boilerplate(&self, paragraph: &str) -> bool {
        let lower = paragraph.to_lowercase();
        self.boilerplate_prefixes.iter().any(|prefix| lower.starts_with(prefix.as_str()))
    }
}

fn parse_selector(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| anyhow!("invalid CSS selector '{}': {:?}", source, e))
}

/// Collapse every whitespace run (newlines included) into one space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
