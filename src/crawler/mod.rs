//! Crawl pipeline
//!
//! The coordinator drives page-by-page listing traversal, the fetcher
//! retrieves and extracts one article at a time with bounded retries,
//! the listing parser turns a listing document into candidates, and the
//! formatter canonicalizes raw scrapes into [`crate::model::Article`]
//! records.

pub mod coordinator;
pub mod fetcher;
pub mod formatter;
pub mod listing;

pub use coordinator::{Coordinator, CrawlReport, StopReason};
pub use fetcher::{ArticleFetcher, FetchError};
pub use listing::{Candidate, ListingPage};

use rand::Rng;
use std::time::Duration;

/// Sleeps for a random duration inside the given millisecond range
///
/// Keeps request pacing irregular. A zero range returns immediately so
/// tests can run undelayed.
pub(crate) async fn jittered_sleep(min_ms: u64, max_ms: u64) {
    let max_ms = max_ms.max(min_ms);
    if max_ms == 0 {
        return;
    }
    let wait = rand::thread_rng().gen_range(min_ms..=max_ms);
    tokio::time::sleep(Duration::from_millis(wait)).await;
}
