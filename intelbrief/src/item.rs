use serde::{Deserialize, Serialize};

/// Hard cap on item content after any crawl step.
pub const MAX_CONTENT_CHARS: usize = 15_000;

/// How far a news item has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Feed summary only, pending enrichment
    Headline,
    /// Content replaced by the full rendered article text
    FullArticle,
    /// Whole-page capture of a configured scrape target
    PageScrape,
    /// Headline recovered from an aggregator page; canonical URL unknown
    NeedsSearch,
}

/// One discovered article or headline. Ephemeral: lives for a single run,
/// only the (url, title, source) triple is ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: String,
    pub title: String,
    /// Canonical link; unique key for deduplication
    pub url: String,
    pub content: String,
    pub kind: ItemKind,
    /// Best-effort upstream attribution when discovered via an aggregator
    pub original_source: Option<String>,
}

impl NewsItem {
    pub fn headline(
        source: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            url: url.into(),
            content: summary.into(),
            kind: ItemKind::Headline,
            original_source: None,
        }
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_input_alone() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let s = "ααααα"; // 5 chars, 10 bytes
        assert_eq!(truncate_chars(s, 3), "ααα");
        assert_eq!(truncate_chars(s, 5), s);
    }

    #[test]
    fn truncate_applies_cap() {
        let long = "x".repeat(MAX_CONTENT_CHARS + 100);
        assert_eq!(truncate_chars(&long, MAX_CONTENT_CHARS).len(), MAX_CONTENT_CHARS);
    }
}
