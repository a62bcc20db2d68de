use anyhow::{Context, Result};
use chrono::Local;
use common::Config;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::digest;
use crate::discovery;
use crate::ingestion;
use crate::item::NewsItem;
use crate::llm::LlmProvider;
use crate::memory::NewsMemory;
use crate::scraping::{self, PageReader, Politeness, DEFAULT_MAX_TARGETS};

/// What one run did; returned for logging and tests.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub items_fetched: usize,
    pub new_items: usize,
    pub recorded: usize,
    pub output_path: Option<PathBuf>,
}

/// Execute one digest run: fetch → dedupe → enrich → generate → publish →
/// record. Strictly sequential; stage failures are handled here (skip or
/// degrade), so collaborators stay policy-free.
pub async fn run(
    config: &Config,
    memory: &NewsMemory,
    provider: &dyn LlmProvider,
    dry_run: bool,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    // 1. Initialize the seen-set. Connectivity failures degrade the run
    // (duplicates may slip through) but never abort it.
    if let Err(e) = memory.init_db().await {
        error!(error = %e, "memory store init failed; continuing without durable dedup");
    }

    let politeness = Politeness::from_config(config.politeness.as_ref());
    let fetch_timeout = config
        .politeness
        .as_ref()
        .and_then(|p| p.fetch_timeout_seconds)
        .unwrap_or(ingestion::FEED_TIMEOUT_SECS);

    // 2. Gather headlines.
    let client = ingestion::feed_client(fetch_timeout)?;
    let mut all_items: Vec<NewsItem> = Vec::new();

    info!("fetching RSS sources");
    for source in &config.sources.rss {
        match ingestion::fetch_source(&client, source).await {
            Ok(items) if items.is_empty() => {
                warn!(source = %source.name, "feed yielded no entries");
            }
            Ok(items) => {
                info!(source = %source.name, count = items.len(), "fetched headlines");
                all_items.extend(items);
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "feed fetch failed, skipping source");
            }
        }
    }

    let reader = PageReader::new(fetch_timeout)?;
    if !config.sources.pages.is_empty() {
        info!("crawling scrape pages");
        let page_items = scraping::crawl_pages(&reader, &config.sources.pages, &politeness).await;

        if config.enrichment_strategy() == "search" {
            // Aggregator mode: recover individual headlines from each page
            // capture; keep the raw capture only when nothing was found.
            for page_item in page_items {
                let extracted = discovery::extract_aggregator_headlines(&page_item);
                if extracted.is_empty() {
                    all_items.push(page_item);
                } else {
                    info!(page = %page_item.source, count = extracted.len(), "extracted aggregator headlines");
                    all_items.extend(extracted);
                }
            }
        } else {
            all_items.extend(page_items);
        }
    }

    summary.items_fetched = all_items.len();
    if all_items.is_empty() {
        warn!("no data collected, ending run");
        return Ok(summary);
    }

    // 3. Filter duplicates. Store errors fail open: treat the item as new
    // rather than silently dropping it.
    info!("checking memory for duplicates");
    let mut new_items: Vec<NewsItem> = Vec::new();
    for item in all_items {
        match memory.is_duplicate(&item.url).await {
            Ok(true) => {
                info!(title = %item.title, "skipping seen item");
            }
            Ok(false) => new_items.push(item),
            Err(e) => {
                warn!(url = %item.url, error = %e, "dedup check failed, treating as new");
                new_items.push(item);
            }
        }
    }

    summary.new_items = new_items.len();
    if new_items.is_empty() {
        info!("no new items, ending run");
        return Ok(summary);
    }

    // Dedup keys are captured before the deep read: search discovery may
    // swap an item's URL for the canonical article link, but the next run
    // rediscovers the story under its pre-enrichment URL, so that is the
    // key that must land in the seen-set.
    let dedup_keys: Vec<(String, String, String)> = new_items
        .iter()
        .map(|item| (item.url.clone(), item.title.clone(), item.source.clone()))
        .collect();

    // 4. Deep read.
    info!(count = new_items.len(), "starting deep read");
    let max_targets = config
        .enrichment
        .as_ref()
        .and_then(|e| e.max_targets)
        .unwrap_or(DEFAULT_MAX_TARGETS);

    let enriched = if config.enrichment_strategy() == "search" {
        let search_url = config
            .enrichment
            .as_ref()
            .and_then(|e| e.search_url.clone())
            .unwrap_or_else(|| discovery::DEFAULT_SEARCH_URL.to_string());
        discovery::search_enrich(&reader, &client, &search_url, new_items, max_targets, &politeness)
            .await
    } else {
        scraping::enrich_full_text(&reader, new_items, max_targets, &politeness).await
    };

    // 5. Generate the digest. Model errors come back as literal text.
    let system_prompt = config
        .llm
        .as_ref()
        .and_then(|l| l.system_prompt.as_deref())
        .unwrap_or(digest::DEFAULT_SYSTEM_PROMPT);
    let digest_text = digest::generate_digest(provider, system_prompt, &enriched).await;

    // 6. Publish.
    let output_path = publish_digest(config.output_dir(), &digest_text)
        .await
        .context("failed to write digest file")?;
    info!(path = %output_path.display(), "published digest");
    summary.output_path = Some(output_path);

    // 7. Update memory. A failed insert means the item will be seen again
    // next run; logged and dropped.
    if dry_run {
        info!("dry run: skipping memory update");
        return Ok(summary);
    }
    info!("updating memory");
    for (item, (url, title, source)) in enriched.iter().zip(&dedup_keys) {
        match memory.record(url, title, source).await {
            Ok(()) => summary.recorded += 1,
            Err(e) => warn!(url = %url, error = %e, "failed to record item"),
        }
        // Also remember the canonical URL when discovery replaced it, so a
        // direct feed hit on the same article is deduplicated too.
        if item.url != *url {
            if let Err(e) = memory.record(&item.url, &item.title, &item.source).await {
                warn!(url = %item.url, error = %e, "failed to record canonical url");
            }
        }
    }

    Ok(summary)
}

/// Write the dated digest file, overwriting any existing file for the date.
async fn publish_digest(output_dir: &str, digest_text: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("failed to create output directory: {}", output_dir))?;

    let now = Local::now();
    let path = PathBuf::from(output_dir).join(format!("{}.md", now.format("%Y-%m-%d")));
    let body = format!("# Daily Intel: {}\n\n{}", now.format("%d %b %Y"), digest_text);

    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("failed to write digest: {}", path.display()))?;
    Ok(path)
}
