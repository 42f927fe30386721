//! Document session abstraction
//!
//! The crawl pipeline drives all page navigation through this narrow
//! interface: open an isolated context, navigate, wait for a selector,
//! read the document. Keeping the surface this small lets the pagination,
//! retry, and extraction logic run against a scripted fake in tests while
//! production uses the HTTP-backed implementation.
//!
//! Dropping a session releases its underlying resources; release happens
//! on every exit path because ownership ends with the scope.

mod http;

pub use http::{build_http_client, HttpSessionFactory};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by document sessions
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to open session: {0}")]
    Open(String),

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {timeout:?} waiting for selector {selector:?}")]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("No document loaded")]
    NoDocument,
}

/// One isolated browsing context
#[async_trait]
pub trait DocumentSession: Send {
    /// Navigates to the given URL and loads its document
    async fn goto(&mut self, url: &str) -> Result<(), SessionError>;

    /// Waits until the current document contains a node matching `selector`,
    /// giving up after `timeout`
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), SessionError>;

    /// Returns the HTML of the current document
    fn document(&self) -> Result<&str, SessionError>;

    /// URL of the current document, if one is loaded
    fn current_url(&self) -> Option<&str>;
}

/// Opens isolated browsing contexts
///
/// The pipeline opens one long-lived session for listing traversal and a
/// fresh session per article attempt.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn DocumentSession>, SessionError>;
}
