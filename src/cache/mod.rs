//! Thread-safe queryable article snapshot
//!
//! The cache is the boundary between the crawl pipeline (writer) and
//! query callers (readers). One internal lock serializes every
//! operation; it is held only for the in-memory work, never across
//! navigation or disk I/O. Status moves through a small state machine:
//! `preparing` on construction and after `clear`, `ready` once populated,
//! `error` when ingestion fails.

use crate::model::{Article, ArticlePage, ArticleQuery};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;

/// Errors surfaced to query callers
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Lifecycle status of the cache snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Preparing,
    Ready,
    Error,
}

/// Status summary for the service boundary
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub status: ServiceStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub count: usize,
    pub error_message: Option<String>,
}

#[derive(Debug)]
struct CacheInner {
    articles: Vec<Article>,
    status: ServiceStatus,
    last_update: Option<DateTime<Utc>>,
    error_message: Option<String>,
}

/// In-memory snapshot of all known articles
#[derive(Debug)]
pub struct NewsCache {
    inner: Mutex<CacheInner>,
}

impl NewsCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                articles: Vec::new(),
                status: ServiceStatus::Preparing,
                last_update: None,
                error_message: None,
            }),
        }
    }

    /// Current status, last update time, article count, and error message
    pub fn status(&self) -> CacheStatus {
        let inner = self.inner.lock().expect("cache lock poisoned");
        CacheStatus {
            status: inner.status,
            last_update: inner.last_update,
            count: inner.articles.len(),
            error_message: inner.error_message.clone(),
        }
    }

    /// Filters, sorts, and paginates the snapshot
    ///
    /// Category is an exact match; search is a case-insensitive substring
    /// match over title and summary. Results are sorted by date
    /// descending before pagination. Partial data during `preparing` is
    /// served as-is; only an `error` status fails the call.
    pub fn query(&self, query: &ArticleQuery) -> Result<ArticlePage, CacheError> {
        let inner = self.inner.lock().expect("cache lock poisoned");

        if inner.status == ServiceStatus::Error {
            let message = inner
                .error_message
                .clone()
                .unwrap_or_else(|| "ingestion failed".to_string());
            return Err(CacheError::Unavailable(message));
        }

        let mut filtered: Vec<&Article> = inner
            .articles
            .iter()
            .filter(|article| match &query.category {
                Some(category) => &article.category == category,
                None => true,
            })
            .filter(|article| match &query.search {
                Some(search) => {
                    let needle = search.to_lowercase();
                    article.title.to_lowercase().contains(&needle)
                        || article.summary.to_lowercase().contains(&needle)
                }
                None => true,
            })
            .collect();

        // Newest first; YYYY-MM-DD strings order correctly under a plain
        // byte compare, and anything unparsable just lands where it lands
        filtered.sort_by(|a, b| b.date.cmp(&a.date));

        let total = filtered.len();
        let page = query.page.max(1);
        let start = (page - 1).saturating_mul(query.page_size).min(total);
        let end = start.saturating_add(query.page_size).min(total);

        Ok(ArticlePage {
            articles: filtered[start..end].iter().map(|a| (*a).clone()).collect(),
            total,
            page,
            page_size: query.page_size,
            has_next: end < total,
            has_prev: page > 1,
        })
    }

    /// Looks up a single article by id
    ///
    /// Same availability rule as `query`: fails only while the status is
    /// `error`.
    pub fn get(&self, id: &str) -> Result<Option<Article>, CacheError> {
        let inner = self.inner.lock().expect("cache lock poisoned");
        if inner.status == ServiceStatus::Error {
            let message = inner
                .error_message
                .clone()
                .unwrap_or_else(|| "ingestion failed".to_string());
            return Err(CacheError::Unavailable(message));
        }
        Ok(inner.articles.iter().find(|a| a.id == id).cloned())
    }

    /// Appends articles whose URLs are not yet present, in the given order
    ///
    /// An empty `preparing` cache becomes `ready` once at least one
    /// article is present.
    pub fn append(&self, new_articles: Vec<Article>) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        let mut seen: HashSet<String> = inner
            .articles
            .iter()
            .map(|article| article.url.clone())
            .collect();

        let mut appended = 0;
        for article in new_articles {
            if seen.insert(article.url.clone()) {
                inner.articles.push(article);
                appended += 1;
            }
        }

        if appended > 0 {
            inner.last_update = Some(Utc::now());
            tracing::info!(appended, total = inner.articles.len(), "cache appended");
        }

        if !inner.articles.is_empty() && inner.status == ServiceStatus::Preparing {
            inner.status = ServiceStatus::Ready;
            tracing::info!("cache status: preparing -> ready");
        }
    }

    /// Swaps the entire snapshot, ending in `ready`
    pub fn replace(&self, articles: Vec<Article>) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.status = ServiceStatus::Preparing;
        inner.articles = articles;
        inner.last_update = Some(Utc::now());
        inner.error_message = None;
        inner.status = ServiceStatus::Ready;
        tracing::info!(total = inner.articles.len(), "cache replaced");
    }

    /// Empties the snapshot and resets to `preparing`
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.articles.clear();
        inner.last_update = None;
        inner.error_message = None;
        inner.status = ServiceStatus::Preparing;
        tracing::info!("cache cleared");
    }

    /// Marks the cache failed; queries will error until `clear` or `replace`
    pub fn set_error(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let message = message.into();
        tracing::error!(%message, "cache status: error");
        inner.error_message = Some(message);
        inner.status = ServiceStatus::Error;
    }
}

impl Default for NewsCache {
    fn default() -> Self {
        Self::new()
    }
}
