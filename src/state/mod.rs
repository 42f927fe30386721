//! Crawl-run state tracking

use std::collections::HashSet;

/// Ledger of article URLs already ingested
///
/// Loaded once from durable storage when a run starts and grown
/// monotonically while the run fetches; there is deliberately no way to
/// remove an entry.
#[derive(Debug, Default)]
pub struct CrawlState {
    scraped_urls: HashSet<String>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the ledger from previously persisted URLs
    pub fn from_urls(urls: HashSet<String>) -> Self {
        Self { scraped_urls: urls }
    }

    /// Whether this URL has been ingested before
    pub fn is_scraped(&self, url: &str) -> bool {
        self.scraped_urls.contains(url)
    }

    /// Records a URL as ingested; returns false when it was already known
    pub fn mark_scraped(&mut self, url: impl Into<String>) -> bool {
        self.scraped_urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.scraped_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scraped_urls.is_empty()
    }
}
