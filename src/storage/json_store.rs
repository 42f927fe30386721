//! JSON file storage backend
//!
//! Durable storage is a single human-readable JSON array of article
//! records. Every merge is load-merge-write: read the current file,
//! append only unseen URLs, rewrite the whole array.

use crate::model::Article;
use crate::storage::traits::{ArticleStore, StorageResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Article storage backed by one JSON array file
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArticleStore for JsonStore {
    fn load_all(&self) -> StorageResult<Vec<Article>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn merge(&self, batch: &[Article]) -> StorageResult<usize> {
        let mut all = self.load_all()?;
        let existing: HashSet<&str> = all.iter().map(|article| article.url.as_str()).collect();

        let mut fresh: Vec<Article> = Vec::new();
        for article in batch {
            if existing.contains(article.url.as_str()) {
                continue;
            }
            if fresh.iter().any(|seen| seen.url == article.url) {
                continue;
            }
            fresh.push(article.clone());
        }

        if fresh.is_empty() {
            tracing::debug!(path = %self.path.display(), "no new articles to persist");
            return Ok(0);
        }

        let added = fresh.len();
        all.append(&mut fresh);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(&all)?;
        std::fs::write(&self.path, serialized)?;

        tracing::info!(
            added,
            total = all.len(),
            path = %self.path.display(),
            "persisted article batch"
        );
        Ok(added)
    }

    fn scraped_urls(&self) -> StorageResult<HashSet<String>> {
        Ok(self
            .load_all()?
            .into_iter()
            .map(|article| article.url)
            .collect())
    }
}
