/*!
common/src/lib.rs

Shared configuration types and helpers for newsdigest.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader merging a default file with an optional override file
- Resolution of the LLM API credential from the process environment
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default environment variable holding the LLM API key.
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// HTTP server section (merged into Rocket's figment)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Remote LLM endpoint (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    /// No timeout is applied to LLM calls unless this is set
    pub timeout_seconds: Option<u64>,
}

/// Outbound fetching of article pages and feeds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
    pub feed_timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

/// Cross-origin allow-list for the front-end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "https://app-news-summarizer.onrender.com".to_string(),
    ]
}

/// One entry of the content-selector cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorRuleConfig {
    pub selector: String,
    pub min_paragraph_chars: Option<usize>,
}

/// Overrides for the article-text extraction heuristic.
/// Missing fields keep the built-in defaults; a non-empty `rules` list replaces the cascade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub min_article_chars: Option<usize>,
    pub fallback_min_paragraph_chars: Option<usize>,
    pub boilerplate_prefixes: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Vec<SelectorRuleConfig>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub extraction: Option<ExtractionConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// With neither file present the built-in defaults are returned.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Name of the environment variable that must hold the LLM API key.
    pub fn api_key_env(&self) -> &str {
        self.llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Read the LLM API key from the process environment.
    /// A missing or blank value is an error; callers treat it as fatal at startup.
    pub fn resolve_api_key(&self) -> Result<String> {
        let var = self.api_key_env();
        let key = std::env::var(var)
            .with_context(|| format!("{} not found in environment variables. Please set it in a .env file.", var))?;
        if key.trim().is_empty() {
            anyhow::bail!("{} is set but empty", var);
        }
        Ok(key)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_from_string() {
        let toml = r#"
            [server]
            port = 8888

            [llm]
            model = "gemini-2.0-flash"
            api_key_env = "MY_KEY"

            [[extraction.rules]]
            selector = ".story"
            min_paragraph_chars = 40
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.server.port, Some(8888));
        assert_eq!(cfg.llm.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(cfg.api_key_env(), "MY_KEY");
        let extraction = cfg.extraction.expect("extraction section");
        assert_eq!(extraction.rules.len(), 1);
        assert_eq!(extraction.rules[0].min_paragraph_chars, Some(40));
        // Untouched sections fall back to defaults
        assert_eq!(cfg.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn empty_config_is_valid() {
        let cfg: Config = toml::from_str("").expect("parse empty config");
        assert!(cfg.server.port.is_none());
        assert!(cfg.extraction.is_none());
        assert_eq!(cfg.api_key_env(), DEFAULT_API_KEY_ENV);
        assert!(cfg.cors.allowed_origins.contains(&"http://localhost:3000".to_string()));
    }

    #[tokio::test]
    async fn override_file_takes_precedence() {
        let mut default_file = tempfile::NamedTempFile::new().expect("tmp default");
        writeln!(
            default_file,
            "[server]\nbind = \"0.0.0.0\"\nport = 8000\n\n[llm]\nmodel = \"base-model\"\ntemperature = 0.7"
        )
        .expect("write default");

        let mut override_file = tempfile::NamedTempFile::new().expect("tmp override");
        writeln!(override_file, "[server]\nport = 8888\n\n[llm]\nmodel = \"other-model\"")
            .expect("write override");

        let cfg = Config::load_with_defaults(Some(default_file.path()), Some(override_file.path()))
            .await
            .expect("load config");

        assert_eq!(cfg.server.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(cfg.server.port, Some(8888));
        assert_eq!(cfg.llm.model.as_deref(), Some("other-model"));
        assert_eq!(cfg.llm.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn missing_files_yield_defaults() {
        let cfg = Config::load_with_defaults(
            Some(Path::new("/nonexistent/config.default.toml")),
            None,
        )
        .await
        .expect("load defaults");
        assert!(cfg.llm.api_url.is_none());
    }

    #[test]
    fn api_key_resolution() {
        let mut cfg = Config::default();
        cfg.llm.api_key_env = Some("NEWSDIGEST_TEST_KEY_PRESENT".to_string());
        std::env::set_var("NEWSDIGEST_TEST_KEY_PRESENT", "secret");
        assert_eq!(cfg.resolve_api_key().expect("key"), "secret");

        cfg.llm.api_key_env = Some("NEWSDIGEST_TEST_KEY_ABSENT".to_string());
        std::env::remove_var("NEWSDIGEST_TEST_KEY_ABSENT");
        let err = cfg.resolve_api_key().unwrap_err();
        assert!(err.to_string().contains("NEWSDIGEST_TEST_KEY_ABSENT"));
    }
}
