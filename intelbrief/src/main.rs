/*
intelbrief - single-binary main.rs
One invocation = one digest run: fetch headlines, dedupe against memory,
deep-read new items, generate the digest, publish a dated file, record.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use intelbrief::llm::remote::RemoteLlmProvider;
use intelbrief::llm::LlmProvider;
use intelbrief::memory::NewsMemory;
use intelbrief::pipeline;

#[derive(Parser, Debug)]
#[command(name = "intelbrief", about = "Daily deep-tech news digest pipeline")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run the pipeline without recording processed items
    #[arg(long)]
    dry_run: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths: packaged defaults plus an optional override.
    let default_path = PathBuf::from("config.default.toml");
    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    let config = Config::load_with_defaults(
        default_path.exists().then(|| default_path.as_path()),
        override_path.as_deref(),
    )
    .await
    .context("failed to load configuration")?;
    info!(defaults = ?default_path, overrides = ?override_path, "configuration loaded");

    // A missing model credential is the one pre-guard failure: without it
    // the run cannot produce a digest at all.
    let provider = build_provider(&config)?;
    let memory = NewsMemory::new(config.database.path.as_deref())?;
    info!(db_path = %memory.path(), "memory store configured");

    // Guarded run: any pipeline error is fatal to the run but not to the
    // process; a completion line is always emitted.
    info!("starting daily intel run");
    match pipeline::run(&config, &memory, provider.as_ref(), args.dry_run).await {
        Ok(summary) => {
            info!(
                fetched = summary.items_fetched,
                new = summary.new_items,
                recorded = summary.recorded,
                output = ?summary.output_path,
                "run finished"
            );
        }
        Err(e) => {
            error!(error = %e, "fatal run error");
        }
    }
    info!("run complete");

    Ok(())
}

/// Build the remote LLM provider from configuration. The API key comes from
/// the environment variable named in config.
fn build_provider(config: &Config) -> Result<Box<dyn LlmProvider>> {
    let llm = config.llm.as_ref();

    let api_key_env = llm
        .and_then(|l| l.api_key_env.as_deref())
        .unwrap_or("GEMINI_API_KEY");
    let api_key = std::env::var(api_key_env)
        .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))?;

    let api_url = llm
        .and_then(|l| l.api_url.clone())
        .unwrap_or_else(|| {
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions".to_string()
        });
    let model = llm
        .and_then(|l| l.model.clone())
        .unwrap_or_else(|| "gemini-2.5-flash".to_string());
    let timeout_secs = llm.and_then(|l| l.timeout_seconds).unwrap_or(60);
    let max_tokens = llm.and_then(|l| l.max_tokens).unwrap_or(2048);

    info!(%api_url, %model, "LLM provider initialized");
    let provider = RemoteLlmProvider::new(api_url, api_key, model)
        .with_defaults(timeout_secs, max_tokens, 0.7);
    Ok(Box::new(provider))
}
