use anyhow::{Context, Result};
use common::FeedSource;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

use crate::item::NewsItem;

/// Per-feed entry cap. Bounds total run volume.
pub const FEED_ENTRY_CAP: usize = 3;

/// Timeout for plain HTTP feed fetches.
pub const FEED_TIMEOUT_SECS: u64 = 15;

/// Some feed hosts reject unknown clients, so feed requests present a
/// browser-like user agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Build the HTTP client used for feed fetching.
pub fn feed_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .context("failed to build reqwest client")
}

/// Fetch one feed and turn its first entries into headline items.
///
/// Returns Ok with up to [`FEED_ENTRY_CAP`] items; a feed that parses to
/// zero entries yields Ok(empty). Transport and parse failures are returned
/// to the caller, which decides whether to skip or abort.
pub async fn fetch_source(client: &Client, source: &FeedSource) -> Result<Vec<NewsItem>> {
    let response = client
        .get(&source.url)
        .header("Accept", "application/rss+xml, application/xml, text/xml, */*")
        .send()
        .await
        .with_context(|| format!("network error fetching feed {}", source.name))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("feed fetch for {} failed with status: {}", source.name, status);
    }

    let bytes = response
        .bytes()
        .await
        .context("failed to read feed response body")?;
    let feed = parser::parse(bytes.as_ref())
        .with_context(|| format!("failed to parse feed for {}", source.name))?;

    let mut items = Vec::new();
    for entry in feed.entries.iter().take(FEED_ENTRY_CAP) {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default();
        let url = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        if url.is_empty() {
            tracing::debug!(source = %source.name, ?title, "skipping entry without URL");
            continue;
        }
        let summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .unwrap_or_default();

        items.push(NewsItem::headline(&source.name, title, url, summary));
    }

    Ok(items)
}
