//! Crawl coordination
//!
//! The coordinator owns one run: it walks the listing page by page,
//! partitions candidates against the floor identifier and the dedup
//! ledger, fetches eligible articles one at a time, and flushes batches
//! to durable storage and the shared cache. The trailing partial batch
//! is flushed on every exit path, including interruption and errors, so
//! stopping a run never discards fetched work.

use crate::cache::NewsCache;
use crate::config::Config;
use crate::crawler::fetcher::ArticleFetcher;
use crate::crawler::jittered_sleep;
use crate::crawler::listing::{parse_listing, Candidate, ListingPage};
use crate::model::Article;
use crate::session::{DocumentSession, SessionFactory};
use crate::state::CrawlState;
use crate::storage::ArticleStore;
use crate::GleanerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Consecutive all-old listing pages tolerated before stopping
const MAX_ALL_OLD_PAGES: u32 = 3;

/// Why a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured page cap was reached
    MaxPages,
    /// The listing offered no next-page control
    NoNextPage,
    /// Three pages in a row held nothing but historical articles
    AllOldPages,
    /// The run was interrupted from outside
    Interrupted,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub pages_visited: u32,
    pub ingested: usize,
    pub skipped: usize,
    pub stop: StopReason,
}

/// Drives one crawl run end to end
pub struct Coordinator<S: ArticleStore> {
    config: Arc<Config>,
    store: Arc<S>,
    cache: Arc<NewsCache>,
    ledger: CrawlState,
    stop: Arc<AtomicBool>,
    /// Articles fetched since the last flush
    batch: Vec<Article>,
    /// Articles flushed to cache but not yet confirmed on disk
    unpersisted: Vec<Article>,
}

impl<S: ArticleStore> Coordinator<S> {
    /// Creates a coordinator, seeding the dedup ledger from storage
    pub fn new(
        config: Arc<Config>,
        store: Arc<S>,
        cache: Arc<NewsCache>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self, GleanerError> {
        let ledger = CrawlState::from_urls(store.scraped_urls()?);
        tracing::info!(known_urls = ledger.len(), "dedup ledger loaded");

        Ok(Self {
            config,
            store,
            cache,
            ledger,
            stop,
            batch: Vec::new(),
            unpersisted: Vec::new(),
        })
    }

    /// Runs the crawl to completion
    ///
    /// Opening and entering the listing session is the only failure that
    /// aborts a run; everything downstream degrades per page or per
    /// article. Whatever the outcome, the current batch is flushed before
    /// this method returns.
    pub async fn run(
        &mut self,
        factory: &dyn SessionFactory,
        max_pages: Option<u32>,
    ) -> Result<CrawlReport, GleanerError> {
        let mut session = match self.open_listing_session(factory).await {
            Ok(session) => session,
            Err(error) => {
                self.flush();
                return Err(error);
            }
        };

        let result = self.crawl_pages(factory, session.as_mut(), max_pages).await;
        self.flush();

        match &result {
            Ok(report) => tracing::info!(
                pages = report.pages_visited,
                ingested = report.ingested,
                skipped = report.skipped,
                stop = ?report.stop,
                "crawl run finished"
            ),
            Err(error) => tracing::error!(%error, "crawl run failed"),
        }

        result
    }

    async fn open_listing_session(
        &self,
        factory: &dyn SessionFactory,
    ) -> Result<Box<dyn DocumentSession>, GleanerError> {
        let mut session = factory.open().await?;
        tracing::info!(url = %self.config.source.base_url, "entering listing");
        session.goto(&self.config.source.base_url).await?;
        Ok(session)
    }

    async fn crawl_pages(
        &mut self,
        factory: &dyn SessionFactory,
        session: &mut dyn DocumentSession,
        max_pages: Option<u32>,
    ) -> Result<CrawlReport, GleanerError> {
        let base = Url::parse(&self.config.source.base_url)?;
        let config = Arc::clone(&self.config);
        let fetcher = ArticleFetcher::new(&config);

        let mut page_count: u32 = 1;
        let mut all_old_streak: u32 = 0;
        let mut ingested = 0usize;
        let mut skipped = 0usize;

        let stop = 'pages: loop {
            if self.interrupted() {
                break 'pages StopReason::Interrupted;
            }

            tracing::info!(page = page_count, "crawling listing page");
            let listing = self.load_listing(session, &base).await;

            let (old_count, eligible) = self.partition_candidates(listing.candidates);
            if eligible.is_empty() && old_count > 0 {
                all_old_streak += 1;
                tracing::warn!(
                    streak = all_old_streak,
                    limit = MAX_ALL_OLD_PAGES,
                    "page contains only historical articles"
                );
            } else {
                all_old_streak = 0;
            }

            let to_fetch: Vec<Candidate> = eligible
                .into_iter()
                .filter(|candidate| {
                    if self.ledger.is_scraped(&candidate.url) {
                        tracing::debug!(url = %candidate.url, "already ingested, skipping");
                        false
                    } else {
                        true
                    }
                })
                .collect();

            tracing::info!(
                page = page_count,
                new = to_fetch.len(),
                old = old_count,
                "listing page partitioned"
            );

            for (index, candidate) in to_fetch.iter().enumerate() {
                if self.interrupted() {
                    break 'pages StopReason::Interrupted;
                }

                match fetcher.fetch(factory, candidate).await {
                    Ok(article) => {
                        self.ledger.mark_scraped(article.url.clone());
                        self.batch.push(article);
                        ingested += 1;
                        if self.batch.len() >= self.config.crawler.batch_size {
                            self.flush();
                        }
                    }
                    Err(error) => {
                        tracing::warn!(url = %candidate.url, %error, "article skipped");
                        skipped += 1;
                    }
                }

                if index + 1 < to_fetch.len() {
                    jittered_sleep(
                        self.config.crawler.article_delay_min_ms,
                        self.config.crawler.article_delay_max_ms,
                    )
                    .await;
                }
            }

            // Stop conditions, first match wins
            if let Some(max) = max_pages {
                if page_count >= max {
                    break 'pages StopReason::MaxPages;
                }
            }
            let Some(next_url) = listing.next_url else {
                break 'pages StopReason::NoNextPage;
            };
            if all_old_streak >= MAX_ALL_OLD_PAGES {
                break 'pages StopReason::AllOldPages;
            }

            jittered_sleep(
                self.config.crawler.page_delay_min_ms,
                self.config.crawler.page_delay_max_ms,
            )
            .await;

            if let Err(error) = session.goto(&next_url).await {
                tracing::warn!(url = %next_url, %error, "failed to open next page");
                break 'pages StopReason::NoNextPage;
            }
            page_count += 1;
        };

        Ok(CrawlReport {
            pages_visited: page_count,
            ingested,
            skipped,
            stop,
        })
    }

    /// Reads the current listing page; a page whose container never
    /// renders yields zero candidates and traversal moves on
    async fn load_listing(&self, session: &mut dyn DocumentSession, base: &Url) -> ListingPage {
        let timeout = Duration::from_millis(self.config.crawler.selector_timeout_ms);
        if let Err(error) = session
            .wait_for(&self.config.source.listing_selector, timeout)
            .await
        {
            // The pager may still be present, so parse whatever loaded
            tracing::warn!(%error, "listing container did not appear");
        }

        match session.document() {
            Ok(html) => {
                let current = session
                    .current_url()
                    .and_then(|u| Url::parse(u).ok())
                    .unwrap_or_else(|| base.clone());
                parse_listing(html, &current, &self.config.source)
            }
            Err(error) => {
                tracing::warn!(%error, "listing document unavailable");
                ListingPage::default()
            }
        }
    }

    /// Splits candidates into (old count, eligible)
    ///
    /// A candidate is old when its identifier parses and sits at or below
    /// the floor; an unparsable identifier keeps it eligible because its
    /// age cannot be established.
    fn partition_candidates(&self, candidates: Vec<Candidate>) -> (usize, Vec<Candidate>) {
        let floor = self.config.crawler.min_article_id;
        let mut old_count = 0;
        let mut eligible = Vec::new();

        for candidate in candidates {
            match candidate.article_id {
                Some(id) if id <= floor => {
                    tracing::debug!(url = %candidate.url, id, floor, "historical article");
                    old_count += 1;
                }
                _ => eligible.push(candidate),
            }
        }

        (old_count, eligible)
    }

    /// Moves the current batch into the cache and retries everything not
    /// yet confirmed on disk
    ///
    /// A failed write keeps the articles queued; the idempotent merge
    /// makes the next retry safe even if parts of the batch did land.
    fn flush(&mut self) {
        if !self.batch.is_empty() {
            self.cache.append(self.batch.clone());
            self.unpersisted.append(&mut self.batch);
        }

        if self.unpersisted.is_empty() {
            return;
        }

        match self.store.merge(&self.unpersisted) {
            Ok(_) => self.unpersisted.clear(),
            Err(error) => {
                tracing::error!(
                    %error,
                    queued = self.unpersisted.len(),
                    "persist failed, batch kept for next flush"
                );
            }
        }
    }

    fn interrupted(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::FakeSessionFactory;
    use crate::storage::{JsonStore, StorageError, StorageResult};
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    const LISTING_URL: &str = "https://ost.example.com/postlist";

    fn config(min_article_id: u64, batch_size: usize, data_path: &str) -> Arc<Config> {
        let toml = format!(
            r#"
[source]
base-url = "{LISTING_URL}"
name = "ExampleTech"
category = "Engineering"
next-page-label = "Next"

[crawler]
min-article-id = {min_article_id}
batch-size = {batch_size}
retry-attempts = 2
selector-timeout-ms = 50
article-delay-min-ms = 0
article-delay-max-ms = 0
page-delay-min-ms = 0
page-delay-max-ms = 0
retry-delay-min-ms = 0
retry-delay-max-ms = 0

[output]
data-path = "{data_path}"
"#
        );
        Arc::new(toml::from_str(&toml).unwrap())
    }

    fn listing_page(ids: &[u64], next: Option<&str>) -> String {
        let mut items = String::new();
        for id in ids {
            items.push_str(&format!(
                r#"<li><a href="/posts/{id}"><h3 class="title-h3">Article {id}</h3></a></li>"#
            ));
        }
        let pager = next
            .map(|n| format!(r#"<a href="{n}">Next</a>"#))
            .unwrap_or_default();
        format!(r#"<ul class="infinite-list">{items}</ul>{pager}"#)
    }

    fn article_page(id: u64) -> String {
        format!(
            r#"<html><body>
            <time>2025-03-05</time>
            <div class="posts-content"><p>body of article {id} with plenty of text</p></div>
            </body></html>"#
        )
    }

    fn page_url(id: u64) -> String {
        format!("https://ost.example.com/posts/{id}")
    }

    struct Harness {
        config: Arc<Config>,
        store: Arc<JsonStore>,
        cache: Arc<NewsCache>,
        stop: Arc<AtomicBool>,
        _dir: TempDir,
    }

    fn harness(min_article_id: u64, batch_size: usize) -> Harness {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("articles.json");
        let config = config(min_article_id, batch_size, data_path.to_str().unwrap());
        Harness {
            config,
            store: Arc::new(JsonStore::new(data_path)),
            cache: Arc::new(NewsCache::new()),
            stop: Arc::new(AtomicBool::new(false)),
            _dir: dir,
        }
    }

    impl Harness {
        fn coordinator(&self) -> Coordinator<JsonStore> {
            Coordinator::new(
                Arc::clone(&self.config),
                Arc::clone(&self.store),
                Arc::clone(&self.cache),
                Arc::clone(&self.stop),
            )
            .unwrap()
        }
    }

    #[tokio::test]
    async fn test_single_page_crawl_ingests_and_persists() {
        let h = harness(0, 5);
        let factory = FakeSessionFactory::new();
        factory.add_page(LISTING_URL, &listing_page(&[34001, 34002], None));
        factory.add_page(&page_url(34001), &article_page(34001));
        factory.add_page(&page_url(34002), &article_page(34002));

        let report = h.coordinator().run(&factory, None).await.unwrap();

        assert_eq!(report.stop, StopReason::NoNextPage);
        assert_eq!(report.pages_visited, 1);
        assert_eq!(report.ingested, 2);
        assert_eq!(report.skipped, 0);

        // Durable storage and cache both hold the run's articles
        assert_eq!(h.store.load_all().unwrap().len(), 2);
        assert_eq!(h.cache.status().count, 2);
    }

    #[tokio::test]
    async fn test_three_all_old_pages_stop_with_zero_ingested() {
        let h = harness(40_000, 5);
        let factory = FakeSessionFactory::new();
        let page2 = format!("{LISTING_URL}?page=2");
        let page3 = format!("{LISTING_URL}?page=3");
        let page4 = format!("{LISTING_URL}?page=4");
        factory.add_page(LISTING_URL, &listing_page(&[34001, 34002], Some(&page2)));
        factory.add_page(&page2, &listing_page(&[33000], Some(&page3)));
        factory.add_page(&page3, &listing_page(&[32000], Some(&page4)));
        factory.add_page(&page4, &listing_page(&[31000], Some(LISTING_URL)));

        let report = h.coordinator().run(&factory, None).await.unwrap();

        assert_eq!(report.stop, StopReason::AllOldPages);
        assert_eq!(report.pages_visited, 3);
        assert_eq!(report.ingested, 0);
        assert!(h.store.load_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_pages_do_not_count_as_all_old() {
        let h = harness(40_000, 5);
        let factory = FakeSessionFactory::new();
        let page2 = format!("{LISTING_URL}?page=2");
        let page3 = format!("{LISTING_URL}?page=3");
        let page4 = format!("{LISTING_URL}?page=4");
        let page5 = format!("{LISTING_URL}?page=5");
        // Old, empty, old, old: the empty page breaks the streak, so it
        // never reaches 3
        factory.add_page(LISTING_URL, &listing_page(&[33000], Some(&page2)));
        factory.add_page(&page2, &listing_page(&[], Some(&page3)));
        factory.add_page(&page3, &listing_page(&[32000], Some(&page4)));
        factory.add_page(&page4, &listing_page(&[31000], Some(&page5)));
        factory.add_page(&page5, &listing_page(&[], None));

        let report = h.coordinator().run(&factory, None).await.unwrap();

        // The streak is broken by the zero-candidate page, so traversal
        // only ends when the pager runs out
        assert_eq!(report.stop, StopReason::NoNextPage);
        assert_eq!(report.pages_visited, 5);
    }

    #[tokio::test]
    async fn test_max_pages_cap() {
        let h = harness(0, 5);
        let factory = FakeSessionFactory::new();
        let page2 = format!("{LISTING_URL}?page=2");
        factory.add_page(LISTING_URL, &listing_page(&[34001], Some(&page2)));
        factory.add_page(&page2, &listing_page(&[34002], Some(LISTING_URL)));
        factory.add_page(&page_url(34001), &article_page(34001));
        factory.add_page(&page_url(34002), &article_page(34002));

        let report = h.coordinator().run(&factory, Some(2)).await.unwrap();

        assert_eq!(report.stop, StopReason::MaxPages);
        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.ingested, 2);
    }

    #[tokio::test]
    async fn test_ledger_skips_known_urls() {
        let h = harness(0, 5);
        let factory = FakeSessionFactory::new();
        factory.add_page(LISTING_URL, &listing_page(&[34001, 34002], None));
        factory.add_page(&page_url(34001), &article_page(34001));
        factory.add_page(&page_url(34002), &article_page(34002));

        let first = h.coordinator().run(&factory, None).await.unwrap();
        assert_eq!(first.ingested, 2);

        // A second run over the same listing finds nothing new
        let second = h.coordinator().run(&factory, None).await.unwrap();
        assert_eq!(second.ingested, 0);
        assert_eq!(h.store.load_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unparsable_id_stays_eligible() {
        let h = harness(40_000, 5);
        let factory = FakeSessionFactory::new();
        let listing = r##"<ul class="infinite-list">
            <li><a href="/posts/draft-abc"><h3 class="title-h3">Undated draft</h3></a></li>
        </ul>"##;
        factory.add_page(LISTING_URL, listing);
        factory.add_page(
            "https://ost.example.com/posts/draft-abc",
            &article_page(99999),
        );

        let report = h.coordinator().run(&factory, None).await.unwrap();
        assert_eq!(report.ingested, 1);
    }

    #[tokio::test]
    async fn test_failed_article_does_not_abort_page() {
        let h = harness(0, 5);
        let factory = FakeSessionFactory::new();
        factory.add_page(LISTING_URL, &listing_page(&[34001, 34002], None));
        // 34001 never renders its content container
        factory.add_page(&page_url(34001), "<html><body>spinner</body></html>");
        factory.add_page(&page_url(34002), &article_page(34002));

        let report = h.coordinator().run(&factory, None).await.unwrap();

        assert_eq!(report.ingested, 1);
        assert_eq!(report.skipped, 1);
        let stored = h.store.load_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].url, page_url(34002));
    }

    #[tokio::test]
    async fn test_trailing_partial_batch_flushed() {
        // Batch size far above the article count, so only the final
        // flush can have persisted anything
        let h = harness(0, 50);
        let factory = FakeSessionFactory::new();
        factory.add_page(LISTING_URL, &listing_page(&[34001, 34002], None));
        factory.add_page(&page_url(34001), &article_page(34001));
        factory.add_page(&page_url(34002), &article_page(34002));

        let report = h.coordinator().run(&factory, None).await.unwrap();
        assert_eq!(report.ingested, 2);
        assert_eq!(h.store.load_all().unwrap().len(), 2);
        assert_eq!(h.cache.status().count, 2);
    }

    #[tokio::test]
    async fn test_interrupted_run_flushes_batch() {
        let h = harness(0, 50);
        let factory = FakeSessionFactory::new();
        let page2 = format!("{LISTING_URL}?page=2");
        factory.add_page(LISTING_URL, &listing_page(&[34001], Some(&page2)));
        factory.add_page(&page2, &listing_page(&[34002], None));
        factory.add_page(&page_url(34001), &article_page(34001));
        factory.add_page(&page_url(34002), &article_page(34002));

        // Opening the first article session (open number 2, after the
        // listing session) trips the stop flag, so the run is told to
        // stop while that article is still in flight
        factory.set_stop_after_opens(2, Arc::clone(&h.stop));

        let report = h.coordinator().run(&factory, None).await.unwrap();

        assert_eq!(report.stop, StopReason::Interrupted);
        assert_eq!(report.ingested, 1);
        // Work fetched before the interrupt reached disk and cache
        assert_eq!(h.store.load_all().unwrap().len(), 1);
        assert_eq!(h.cache.status().count, 1);
    }

    #[tokio::test]
    async fn test_session_open_failure_aborts_run() {
        let h = harness(0, 5);
        let factory = FakeSessionFactory::failing();
        let result = h.coordinator().run(&factory, None).await;
        assert!(matches!(result, Err(GleanerError::Session(_))));
    }

    #[tokio::test]
    async fn test_unrenderable_listing_page_moves_on() {
        let h = harness(0, 5);
        let factory = FakeSessionFactory::new();
        let page2 = format!("{LISTING_URL}?page=2");
        // Page 1 has no listing container at all, page 2 works
        factory.add_page(LISTING_URL, &format!(r#"<p>maintenance</p><a href="{page2}">Next</a>"#));
        factory.add_page(&page2, &listing_page(&[34001], None));
        factory.add_page(&page_url(34001), &article_page(34001));

        let report = h.coordinator().run(&factory, None).await.unwrap();
        // The broken page yields nothing but the crawl continues past it
        assert_eq!(report.stop, StopReason::NoNextPage);
        assert_eq!(report.ingested, 1);
    }

    /// Store whose merges fail while `failures_left` is nonzero
    struct FlakyStore {
        inner: JsonStore,
        failures_left: AtomicUsize,
    }

    impl ArticleStore for FlakyStore {
        fn load_all(&self) -> StorageResult<Vec<Article>> {
            self.inner.load_all()
        }

        fn merge(&self, batch: &[Article]) -> StorageResult<usize> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.inner.merge(batch)
        }

        fn scraped_urls(&self) -> StorageResult<HashSet<String>> {
            self.inner.scraped_urls()
        }
    }

    #[tokio::test]
    async fn test_failed_persist_retried_on_next_flush() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("articles.json");
        let config = config(0, 1, data_path.to_str().unwrap());
        let store = Arc::new(FlakyStore {
            inner: JsonStore::new(&data_path),
            failures_left: AtomicUsize::new(1),
        });
        let cache = Arc::new(NewsCache::new());
        let stop = Arc::new(AtomicBool::new(false));

        let factory = FakeSessionFactory::new();
        factory.add_page(LISTING_URL, &listing_page(&[34001, 34002], None));
        factory.add_page(&page_url(34001), &article_page(34001));
        factory.add_page(&page_url(34002), &article_page(34002));

        let mut coordinator =
            Coordinator::new(config, Arc::clone(&store), cache, stop).unwrap();
        let report = coordinator.run(&factory, None).await.unwrap();

        assert_eq!(report.ingested, 2);
        // First flush failed, second carried both articles to disk
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_with_query_pagination_resolves_relative_links() {
        let h = harness(0, 5);
        let factory = FakeSessionFactory::new();
        // Relative next href resolved against the current page URL
        factory.add_page(LISTING_URL, &listing_page(&[34001], Some("/postlist?page=2")));
        factory.add_page(
            "https://ost.example.com/postlist?page=2",
            &listing_page(&[34002], None),
        );
        factory.add_page(&page_url(34001), &article_page(34001));
        factory.add_page(&page_url(34002), &article_page(34002));

        let report = h.coordinator().run(&factory, None).await.unwrap();
        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.ingested, 2);
    }
}
