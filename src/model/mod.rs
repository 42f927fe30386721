//! Typed article records shared across the pipeline
//!
//! These are the canonical shapes for everything the pipeline produces:
//! content blocks, articles, and the query/page types the cache serves.
//! Serialized field names match the durable JSON file format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind tag of one content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Code,
}

/// One unit of extracted article content
///
/// `language` is only meaningful for code blocks; an empty string means
/// the language could not be detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ContentBlock {
    /// Creates a text block
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Text,
            value: value.into(),
            language: None,
        }
    }

    /// Creates an image block from an absolute source URL
    pub fn image(value: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Image,
            value: value.into(),
            language: None,
        }
    }

    /// Creates a code block; pass an empty language for "undetected"
    pub fn code(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Code,
            value: value.into(),
            language: Some(language.into()),
        }
    }
}

/// A canonical harvested article
///
/// `url` is the sole external identity key; it is never regenerated or
/// mutated after creation. `id` is derived from `url` alone, so
/// re-ingesting the same URL always produces the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    /// Normalized publish date, YYYY-MM-DD
    pub date: String,
    pub url: String,
    pub content: Vec<ContentBlock>,
    pub category: String,
    pub summary: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters accepted by the cache snapshot
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    /// Exact category match
    pub category: Option<String>,
    /// Case-insensitive substring match over title and summary
    pub search: Option<String>,
}

/// One page of query results plus pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    /// Post-filter, pre-pagination count
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_prev: bool,
}
