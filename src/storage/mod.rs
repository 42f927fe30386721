//! Durable article storage
//!
//! One JSON array file holds every article ever ingested. The store is
//! the authority for the dedup invariant: merging overlapping batches
//! any number of times never produces two records with the same URL.

mod json_store;
mod traits;

pub use json_store::JsonStore;
pub use traits::{ArticleStore, StorageError, StorageResult};
