/*!
common/src/lib.rs

Shared configuration types for intelbrief.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file
- A layered loader that merges a default file with an override file
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Database configuration section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Path to the sqlite database file (e.g. "data/memory.db").
    /// When absent the store falls back to a local file next to the binary.
    pub path: Option<String>,
}

/// Output configuration section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory into which dated digest files are written
    pub dir: Option<String>,
}

/// One RSS feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

/// One page that has no feed and must be scraped directly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSource {
    pub name: String,
    pub url: String,
    /// CSS selector hint for the content region; "body" when absent
    pub selector: Option<String>,
}

/// Ordered source lists
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub rss: Vec<FeedSource>,
    #[serde(default)]
    pub pages: Vec<PageSource>,
}

/// Remote LLM config (OpenAI-compatible chat completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    /// System instruction passed ahead of the collected article data
    pub system_prompt: Option<String>,
}

/// Enrichment (deep read) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnrichmentConfig {
    /// "direct" visits each item's own URL; "search" discovers a canonical
    /// article URL through a search engine first
    pub strategy: Option<String>,
    /// How many items from the head of the candidate list get a deep read
    pub max_targets: Option<usize>,
    /// HTML search endpoint used by the "search" strategy
    pub search_url: Option<String>,
}

/// Politeness / pacing configuration. Defaults preserve the pipeline's
/// fixed sleep constants; tests set these to zero.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolitenessConfig {
    pub page_delay_min_ms: Option<u64>,
    pub page_delay_max_ms: Option<u64>,
    pub enrich_delay_ms: Option<u64>,
    pub fetch_timeout_seconds: Option<u64>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    pub llm: Option<LlmConfig>,
    pub enrichment: Option<EnrichmentConfig>,
    pub politeness: Option<PolitenessConfig>,
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
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Enrichment strategy name, defaulting to the direct-link deep read.
    pub fn enrichment_strategy(&self) -> &str {
        self.enrichment
            .as_ref()
            .and_then(|e| e.strategy.as_deref())
            .unwrap_or("direct")
    }

    /// Digest output directory.
    pub fn output_dir(&self) -> &str {
        self.output.dir.as_deref().unwrap_or("content")
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
