//! Storage trait and error types

use crate::model::Article;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable article storage
///
/// Implementations must uphold the dedup invariant: no two stored
/// articles ever share a URL, no matter how often overlapping batches
/// are merged.
pub trait ArticleStore: Send + Sync {
    /// Loads every stored article; empty when nothing has been persisted
    fn load_all(&self) -> StorageResult<Vec<Article>>;

    /// Merges a batch into storage, skipping URLs already present
    ///
    /// Returns the number of articles actually appended. Safe to call
    /// repeatedly with overlapping batches.
    fn merge(&self, batch: &[Article]) -> StorageResult<usize>;

    /// URLs currently persisted, used to seed the dedup ledger
    fn scraped_urls(&self) -> StorageResult<HashSet<String>>;
}
