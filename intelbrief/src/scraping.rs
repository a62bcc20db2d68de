use anyhow::{Context, Result};
use common::{PageSource, PolitenessConfig};
use rand::Rng;
use reqwest::Client;
use std::io::Cursor;
use std::time::Duration;
use tracing::{info, warn};

use crate::item::{truncate_chars, ItemKind, NewsItem, MAX_CONTENT_CHARS};

/// Rendered text shorter than this is treated as a failed read and the
/// item keeps its feed summary.
pub const MIN_FULL_TEXT_CHARS: usize = 500;

/// How many items from the head of the candidate list get a deep read.
pub const DEFAULT_MAX_TARGETS: usize = 5;

/// Fixed pacing between page requests. A crude throttle, kept from the
/// original pipeline; configurable so tests can run without delays.
#[derive(Debug, Clone, Copy)]
pub struct Politeness {
    pub page_delay_min_ms: u64,
    pub page_delay_max_ms: u64,
    pub enrich_delay_ms: u64,
}

impl Politeness {
    pub fn from_config(config: Option<&PolitenessConfig>) -> Self {
        Self {
            page_delay_min_ms: config.and_then(|c| c.page_delay_min_ms).unwrap_or(2_000),
            page_delay_max_ms: config.and_then(|c| c.page_delay_max_ms).unwrap_or(5_000),
            enrich_delay_ms: config.and_then(|c| c.enrich_delay_ms).unwrap_or(1_000),
        }
    }

    /// Randomized delay before a whole-page crawl, to reduce throttling risk.
    async fn page_delay(&self) {
        let ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.page_delay_min_ms..=self.page_delay_max_ms.max(self.page_delay_min_ms))
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    pub(crate) async fn enrich_delay(&self) {
        tokio::time::sleep(Duration::from_millis(self.enrich_delay_ms)).await;
    }
}

/// Black-box "url -> rendered page text" capability. Fetches the page and
/// extracts its readable text, capped at [`MAX_CONTENT_CHARS`].
pub struct PageReader {
    client: Client,
}

impl PageReader {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }

    /// Fetch a page and return its readable text content.
    pub async fn read_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to fetch page")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("page fetch failed with status: {}", status);
        }

        let bytes = response
            .bytes()
            .await
            .context("failed to read response body")?;
        let mut reader = Cursor::new(bytes);
        let url_obj = url::Url::parse(url).context("failed to parse page URL")?;

        let text = match readability::extractor::extract(&mut reader, &url_obj) {
            Ok(product) => {
                // product.content is the HTML of the main content region;
                // convert to markdown-ish text for cleaner LLM input.
                match html2text::from_read(product.content.as_bytes(), 80) {
                    Ok(markdown) => markdown,
                    Err(e) => {
                        warn!(%url, error = %e, "failed to convert extracted HTML to text");
                        product.text
                    }
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "readability extraction failed");
                String::new()
            }
        };

        Ok(truncate_chars(&text, MAX_CONTENT_CHARS))
    }
}

/// Scrape each configured page into one whole-page item. Failed pages are
/// skipped; no retry.
pub async fn crawl_pages(
    reader: &PageReader,
    pages: &[PageSource],
    politeness: &Politeness,
) -> Vec<NewsItem> {
    let mut items = Vec::new();

    for page in pages {
        politeness.page_delay().await;
        match reader.read_page(&page.url).await {
            Ok(content) => {
                info!(page = %page.name, chars = content.chars().count(), "captured page");
                items.push(NewsItem {
                    source: page.name.clone(),
                    title: format!("Scrape of {}", page.name),
                    url: page.url.clone(),
                    content,
                    kind: ItemKind::PageScrape,
                    original_source: None,
                });
            }
            Err(e) => {
                warn!(page = %page.name, error = %e, "page scrape failed, skipping");
            }
        }
    }

    items
}

/// Visit the links of the leading items and replace their feed summaries
/// with full article text.
///
/// Only the first `max_targets` items are visited (a fixed-size prefix, a
/// deliberate time/bandwidth tradeoff); everything beyond the prefix is
/// returned unmodified. Whole-page items pass through unchanged.
pub async fn enrich_full_text(
    reader: &PageReader,
    mut items: Vec<NewsItem>,
    max_targets: usize,
    politeness: &Politeness,
) -> Vec<NewsItem> {
    let rest = if items.len() > max_targets {
        items.split_off(max_targets)
    } else {
        Vec::new()
    };

    for item in &mut items {
        if item.kind == ItemKind::PageScrape {
            continue;
        }

        politeness.enrich_delay().await;
        match reader.read_page(&item.url).await {
            Ok(text) if text.chars().count() > MIN_FULL_TEXT_CHARS => {
                info!(title = %item.title, chars = text.chars().count(), "captured full article");
                item.content = text;
                item.kind = ItemKind::FullArticle;
            }
            Ok(_) => {
                info!(title = %item.title, "full text too short, keeping summary");
            }
            Err(e) => {
                warn!(title = %item.title, error = %e, "failed to read full article");
            }
        }
    }

    items.extend(rest);
    items
}
