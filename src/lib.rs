//! Gleaner: an incremental article harvester
//!
//! This crate implements a crawl-and-ingest pipeline that walks a paginated
//! article listing, extracts each article into typed content blocks,
//! deduplicates by URL against everything seen before, and feeds a
//! thread-safe queryable cache backed by a JSON article file.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod service;
pub mod session;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum GleanerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, GleanerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CacheStatus, NewsCache, ServiceStatus};
pub use config::Config;
pub use model::{Article, ArticlePage, ArticleQuery, ContentBlock, ContentKind};
pub use service::NewsService;
