//! Search-assisted discovery: recovering canonical article URLs when only
//! a headline is known, and pulling headlines out of aggregator pages.
//!
//! The attribution heuristic here is plain string matching over adjacent
//! lines of captured page text. It is a low-confidence fallback signal used
//! only to steer query construction, never persisted as fact.

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::item::{ItemKind, NewsItem};
use crate::scraping::{PageReader, Politeness, MIN_FULL_TEXT_CHARS};

/// Upper bound on headlines recovered from one aggregator page.
pub const AGGREGATOR_HEADLINE_CAP: usize = 5;

/// Default HTML search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Known outlets: keyword found in an attribution line mapped to the domain
/// used for `site:` scoped queries.
const OUTLET_DOMAINS: &[(&str, &str)] = &[
    ("yourstory", "yourstory.com"),
    ("inc42", "inc42.com"),
    ("entrackr", "entrackr.com"),
    ("the ken", "the-ken.com"),
    ("et tech", "economictimes.indiatimes.com"),
    ("economic times", "economictimes.indiatimes.com"),
    ("livemint", "livemint.com"),
    ("mint", "livemint.com"),
    ("moneycontrol", "moneycontrol.com"),
    ("business standard", "business-standard.com"),
];

/// Aggregator and social hosts that are never useful enrichment targets.
/// The search engine itself is listed so a redirect link that fails to
/// unwrap is skipped rather than scraped.
const BLOCKED_HOSTS: &[&str] = &[
    "news.google.com",
    "google.com",
    "duckduckgo.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "linkedin.com",
    "youtube.com",
    "reddit.com",
    "inshorts.com",
    "flipboard.com",
];

/// Map a free-form outlet name to a known domain.
pub fn known_outlet_domain(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    OUTLET_DOMAINS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, domain)| *domain)
}

/// True for hosts on the aggregator/social block-list, including subdomains.
pub fn is_blocked_host(host: &str) -> bool {
    BLOCKED_HOSTS
        .iter()
        .any(|blocked| host == *blocked || host.ends_with(&format!(".{}", blocked)))
}

/// Build the search query for one item.
///
/// Scoped `site:` query when the attribution maps to a known domain;
/// otherwise the attribution name plus a region hint; otherwise generic
/// India tech terms.
pub fn build_search_query(item: &NewsItem) -> String {
    if let Some(original) = item.original_source.as_deref() {
        if let Some(domain) = known_outlet_domain(original) {
            return format!("{} site:{}", item.title, domain);
        }
        return format!("{} {} india", item.title, original);
    }
    if let Some(domain) = known_outlet_domain(&item.source) {
        return format!("{} site:{}", item.title, domain);
    }
    format!("{} india technology startup", item.title)
}

/// Resolve one search-result href to an absolute target URL, unwrapping the
/// engine's redirect links (`//duckduckgo.com/l/?uddg=<encoded>`).
fn resolve_result_href(href: &str) -> Option<Url> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;

    if url.host_str().map(is_blocked_host) == Some(true) {
        if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
            return Url::parse(&target).ok();
        }
    }
    Some(url)
}

/// Pick the first result link whose host is not on the block-list.
pub fn first_unblocked_result(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a.result__a[href]").ok()?;

    for element in document.select(&selector) {
        let href = element.value().attr("href")?;
        if let Some(url) = resolve_result_href(href) {
            match url.host_str() {
                Some(host) if !is_blocked_host(host) => return Some(url.to_string()),
                _ => continue,
            }
        }
    }
    None
}

/// Query the search endpoint and return the first acceptable result URL.
pub async fn search_first_result(
    client: &Client,
    search_url: &str,
    query: &str,
) -> Result<Option<String>> {
    let response = client
        .get(search_url)
        .query(&[("q", query)])
        .send()
        .await
        .context("search request failed")?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("search failed with status: {}", status);
    }

    let html = response
        .text()
        .await
        .context("failed to read search response")?;
    Ok(first_unblocked_result(&html))
}

fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in title.chars().take(60) {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn looks_like_headline(line: &str) -> bool {
    line.len() >= 40 && line.split_whitespace().count() >= 6
}

/// Recover headlines from one captured aggregator page.
///
/// Scans the page text line by line: long sentence-like lines become
/// headlines, and the next couple of lines are searched for a known outlet
/// keyword to use as best-effort attribution. Brittle to source formatting
/// changes by nature; capped at [`AGGREGATOR_HEADLINE_CAP`].
pub fn extract_aggregator_headlines(page: &NewsItem) -> Vec<NewsItem> {
    let lines: Vec<&str> = page
        .content
        .lines()
        .map(|l| l.trim_start_matches(['#', '*', '-', ' ']).trim())
        .collect();

    let mut items = Vec::new();
    let mut i = 0;
    while i < lines.len() && items.len() < AGGREGATOR_HEADLINE_CAP {
        let line = lines[i];
        if looks_like_headline(line) {
            let mut attribution = None;
            for nearby in lines.iter().skip(i + 1).take(2) {
                let lowered = nearby.to_lowercase();
                if let Some((keyword, _)) = OUTLET_DOMAINS
                    .iter()
                    .find(|(keyword, _)| lowered.contains(keyword))
                {
                    attribution = Some(keyword.to_string());
                    break;
                }
            }

            items.push(NewsItem {
                source: page.source.clone(),
                title: line.to_string(),
                // Canonical URL unknown until search; a stable synthetic
                // fragment keeps deduplication working in the meantime.
                url: format!("{}#{}", page.url, slugify(line)),
                content: String::new(),
                kind: ItemKind::NeedsSearch,
                original_source: attribution,
            });
            // Skip the attribution window so one story yields one item
            i += 2;
        }
        i += 1;
    }

    items
}

/// Search-assisted variant of the deep read: discover a canonical article
/// URL for each leading item, then read it the same way as the direct
/// strategy. Prefix and pass-through semantics match
/// [`crate::scraping::enrich_full_text`].
pub async fn search_enrich(
    reader: &PageReader,
    client: &Client,
    search_url: &str,
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
        let query = build_search_query(item);
        let target = match search_first_result(client, search_url, &query).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                info!(title = %item.title, "no acceptable search result");
                continue;
            }
            Err(e) => {
                warn!(title = %item.title, error = %e, "search discovery failed");
                continue;
            }
        };

        politeness.enrich_delay().await;
        match reader.read_page(&target).await {
            Ok(text) if text.chars().count() > MIN_FULL_TEXT_CHARS => {
                info!(title = %item.title, %target, "captured article via search");
                item.content = text;
                item.url = target;
                item.kind = ItemKind::FullArticle;
            }
            Ok(_) => {
                info!(title = %item.title, %target, "discovered page too short, keeping item as-is");
            }
            Err(e) => {
                warn!(title = %item.title, %target, error = %e, "failed to read discovered article");
            }
        }
    }

    items.extend(rest);
    items
}
