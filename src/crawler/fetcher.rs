//! Per-article fetching with bounded retries
//!
//! Each article gets its own isolated session per attempt. Retrying is an
//! explicit state machine capped at the configured attempt count; a
//! failed article is the caller's signal to log and move on, never to
//! abort the surrounding page or run.

use crate::config::Config;
use crate::crawler::formatter::{format_article, RawArticle};
use crate::crawler::jittered_sleep;
use crate::crawler::listing::Candidate;
use crate::extract::extract_article_blocks;
use crate::model::Article;
use crate::session::SessionFactory;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

/// Why one article could not be ingested
#[derive(Debug, Error)]
pub enum FetchError {
    /// Navigation or selector wait failed; worth retrying
    #[error("Transient failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    /// The content container produced zero blocks; worth retrying
    #[error("Extraction yielded no content for {url}")]
    EmptyContent { url: String },
}

/// Retry progression for a single article
#[derive(Debug)]
enum RetryState {
    Attempting(u32),
    Exhausted(FetchError),
}

/// Fetches and canonicalizes one article at a time
pub struct ArticleFetcher<'a> {
    config: &'a Config,
}

impl<'a> ArticleFetcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Produces a formatted article for a candidate, or the error that
    /// exhausted its attempts
    pub async fn fetch(
        &self,
        factory: &dyn SessionFactory,
        candidate: &Candidate,
    ) -> Result<Article, FetchError> {
        let max_attempts = self.config.crawler.retry_attempts;
        let mut state = RetryState::Attempting(1);

        loop {
            match state {
                RetryState::Attempting(attempt) => {
                    if attempt > 1 {
                        tracing::warn!(
                            url = %candidate.url,
                            attempt,
                            max_attempts,
                            "retrying article"
                        );
                    }
                    match self.attempt(factory, candidate).await {
                        Ok(article) => return Ok(article),
                        Err(error) if attempt < max_attempts => {
                            tracing::warn!(url = %candidate.url, %error, "attempt failed");
                            jittered_sleep(
                                self.config.crawler.retry_delay_min_ms,
                                self.config.crawler.retry_delay_max_ms,
                            )
                            .await;
                            state = RetryState::Attempting(attempt + 1);
                        }
                        Err(error) => state = RetryState::Exhausted(error),
                    }
                }
                RetryState::Exhausted(error) => return Err(error),
            }
        }
    }

    /// One attempt: isolated session, navigate, wait, extract, format
    ///
    /// The session lives exactly as long as this scope, so it is released
    /// on success, failure, and early return alike.
    async fn attempt(
        &self,
        factory: &dyn SessionFactory,
        candidate: &Candidate,
    ) -> Result<Article, FetchError> {
        let url = &candidate.url;
        let transient = |reason: String| FetchError::Transient {
            url: url.clone(),
            reason,
        };

        let mut session = factory.open().await.map_err(|e| transient(e.to_string()))?;
        session
            .goto(url)
            .await
            .map_err(|e| transient(e.to_string()))?;
        session
            .wait_for(
                &self.config.source.content_selector,
                Duration::from_millis(self.config.crawler.selector_timeout_ms),
            )
            .await
            .map_err(|e| transient(e.to_string()))?;

        let html = session
            .document()
            .map_err(|e| transient(e.to_string()))?
            .to_string();
        drop(session);

        // Metadata is best-effort; absence is not a failure
        let author = first_text_match(&html, &self.config.source.author_selectors);
        let publish_time = first_text_match(&html, &self.config.source.time_selectors);

        let blocks = extract_article_blocks(&html, &self.config.source.content_selector);
        if blocks.is_empty() {
            return Err(FetchError::EmptyContent { url: url.clone() });
        }

        tracing::info!(
            url = %url,
            blocks = blocks.len(),
            author = author.as_deref().unwrap_or("unknown"),
            "article extracted"
        );

        Ok(format_article(
            RawArticle {
                title: candidate.title.clone(),
                url: url.clone(),
                author,
                publish_time,
                blocks,
            },
            &self.config.source,
        ))
    }
}

/// Tries selectors in priority order, returning the first non-empty
/// trimmed text match
pub(crate) fn first_text_match(html: &str, selectors: &[String]) -> Option<String> {
    let document = Html::parse_document(html);
    for raw_selector in selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = element.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
