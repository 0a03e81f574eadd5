/*
newsdigest - main.rs
Loads configuration and the LLM credential, then serves the summarization API with Rocket.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsdigest::llm::remote::{RemoteLlmProvider, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use newsdigest::llm::LlmProvider;
use newsdigest::pipeline::SummaryPipeline;
use newsdigest::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "newsdigest", about = "Summarizes RSS feeds and news articles with an LLM")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // A missing .env file is fine; the variables may come from the real environment
    if let Ok(path) = dotenv::dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    let config = load_config(args.config).await?;

    // The credential is required before anything binds
    let api_key = match config.resolve_api_key() {
        Ok(key) => key,
        Err(e) => {
            error!(%e, "LLM API key missing; refusing to start");
            return Err(e);
        }
    };

    let provider = create_llm_provider(&config, api_key);
    info!(model = provider.model(), "LLM provider initialized");

    let pipeline = match SummaryPipeline::from_config(&config, provider) {
        Ok(p) => p,
        Err(e) => {
            error!("failed to initialize summary pipeline: {:#}", e);
            return Err(e);
        }
    };

    server::launch_rocket(&config, AppState::new(pipeline)).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Merge `config.default.toml` with `--config FILE` (or `./config.toml` when present).
async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default_file = ?default_path, override_file = ?override_path, "configuration loaded");
    Ok(config)
}

fn create_llm_provider(config: &Config, api_key: String) -> Arc<dyn LlmProvider> {
    let llm = &config.llm;
    let api_url = llm.api_url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let model = llm.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let provider = RemoteLlmProvider::new(api_url, api_key, model).with_defaults(
        llm.timeout_seconds,
        llm.max_tokens,
        llm.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    );
    Arc::new(provider)
}
