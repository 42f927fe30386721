//! Service boundary
//!
//! [`NewsService`] is what an API layer (or the CLI) talks to: query and
//! status reads against the shared cache, plus crawl triggers that return
//! immediately. Crawl runs execute on a bounded worker pool so triggering
//! one never blocks the caller.

use crate::cache::{CacheError, CacheStatus, NewsCache};
use crate::config::Config;
use crate::crawler::{Coordinator, CrawlReport};
use crate::model::{Article, ArticlePage, ArticleQuery};
use crate::session::HttpSessionFactory;
use crate::storage::{ArticleStore, JsonStore};
use crate::GleanerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Handle to an in-flight crawl run
///
/// Dropping the handle detaches the run; it keeps going in the
/// background. `interrupt` asks the run to stop at the next article or
/// page boundary; fetched work is still flushed before it exits.
pub struct CrawlHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Option<CrawlReport>>,
}

impl CrawlHandle {
    /// Asks the run to stop; returns immediately
    pub fn interrupt(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// A cloneable interrupter usable from signal handlers
    pub fn stopper(&self) -> CrawlStopper {
        CrawlStopper {
            stop: Arc::clone(&self.stop),
        }
    }

    /// Waits for the run to finish
    ///
    /// Returns None when the run aborted before producing a report; the
    /// cache status carries the error message in that case.
    pub async fn wait(self) -> Option<CrawlReport> {
        self.handle.await.ok().flatten()
    }
}

/// Detached interrupter for a crawl run
#[derive(Clone)]
pub struct CrawlStopper {
    stop: Arc<AtomicBool>,
}

impl CrawlStopper {
    pub fn interrupt(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Composition root for the pipeline and its shared state
pub struct NewsService {
    config: Arc<Config>,
    cache: Arc<NewsCache>,
    store: Arc<JsonStore>,
    workers: Arc<Semaphore>,
}

impl NewsService {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(JsonStore::new(&config.output.data_path));
        let workers = Arc::new(Semaphore::new(config.crawler.crawl_workers));
        Self {
            config: Arc::new(config),
            cache: Arc::new(NewsCache::new()),
            store,
            workers,
        }
    }

    /// The shared cache instance, for callers that embed the service
    pub fn cache(&self) -> Arc<NewsCache> {
        Arc::clone(&self.cache)
    }

    /// Seeds the cache from the durable article file
    ///
    /// Returns how many articles were loaded. An absent or empty file
    /// leaves the cache in `preparing`.
    pub fn load_existing(&self) -> Result<usize, GleanerError> {
        let articles = self.store.load_all()?;
        let count = articles.len();
        if count > 0 {
            self.cache.replace(articles);
            tracing::info!(count, "cache seeded from existing data");
        } else {
            tracing::info!("no existing data to seed the cache with");
        }
        Ok(count)
    }

    /// Queries the cache snapshot
    pub fn query(&self, query: &ArticleQuery) -> Result<ArticlePage, CacheError> {
        self.cache.query(query)
    }

    /// Looks up a single article by id
    pub fn article(&self, id: &str) -> Result<Option<Article>, CacheError> {
        self.cache.get(id)
    }

    /// Current cache status
    pub fn status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Starts an incremental crawl in the background and returns at once
    ///
    /// `max_pages` overrides the configured page cap for this run.
    pub fn trigger_crawl(&self, max_pages: Option<u32>) -> CrawlHandle {
        self.spawn_run(max_pages.or(self.config.crawler.max_pages), false)
    }

    /// Starts a full re-crawl; when it completes, the cache snapshot is
    /// replaced from durable storage
    pub fn refresh(&self) -> CrawlHandle {
        self.spawn_run(self.config.crawler.max_pages, true)
    }

    fn spawn_run(&self, max_pages: Option<u32>, replace_after: bool) -> CrawlHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let config = Arc::clone(&self.config);
        let cache = Arc::clone(&self.cache);
        let store = Arc::clone(&self.store);
        let workers = Arc::clone(&self.workers);
        let stop_flag = Arc::clone(&stop);

        let handle = tokio::spawn(async move {
            let Ok(_permit) = workers.acquire_owned().await else {
                return None;
            };

            let factory = match HttpSessionFactory::new(&config.session) {
                Ok(factory) => factory,
                Err(error) => {
                    tracing::error!(%error, "failed to build session factory");
                    cache.set_error(error.to_string());
                    return None;
                }
            };

            let mut coordinator =
                match Coordinator::new(config, store.clone(), Arc::clone(&cache), stop_flag) {
                    Ok(coordinator) => coordinator,
                    Err(error) => {
                        tracing::error!(%error, "failed to start crawl run");
                        cache.set_error(error.to_string());
                        return None;
                    }
                };

            let report = match coordinator.run(&factory, max_pages).await {
                Ok(report) => report,
                Err(error) => {
                    cache.set_error(error.to_string());
                    return None;
                }
            };

            if replace_after {
                match store.load_all() {
                    Ok(all) => cache.replace(all),
                    Err(error) => {
                        tracing::error!(%error, "post-refresh reload failed");
                        cache.set_error(error.to_string());
                    }
                }
            }

            Some(report)
        });

        CrawlHandle { stop, handle }
    }
}
