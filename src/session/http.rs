//! HTTP-backed document session
//!
//! Renders the document-session capability over a plain HTTP client:
//! navigation is a GET, waiting for a selector is a bounded re-fetch
//! poll against the parsed document. Each session owns its own view of
//! the current document, so per-article sessions stay isolated.

use crate::config::SessionConfig;
use crate::session::{DocumentSession, SessionError, SessionFactory};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::{Duration, Instant};

/// Builds an HTTP client with the configured identity and timeouts
pub fn build_http_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Opens HTTP-backed document sessions sharing one connection pool
pub struct HttpSessionFactory {
    client: Client,
    poll_interval: Duration,
}

impl HttpSessionFactory {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let client = build_http_client(config).map_err(|e| SessionError::Open(e.to_string()))?;
        Ok(Self {
            client,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn DocumentSession>, SessionError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            poll_interval: self.poll_interval,
            url: None,
            body: None,
        }))
    }
}

struct HttpSession {
    client: Client,
    poll_interval: Duration,
    url: Option<String>,
    body: Option<String>,
}

impl HttpSession {
    fn document_has(&self, selector: &Selector) -> bool {
        match self.body.as_deref() {
            Some(body) => Html::parse_document(body).select(selector).next().is_some(),
            None => false,
        }
    }
}

#[async_trait]
impl DocumentSession for HttpSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {status}"),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| SessionError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        self.url = Some(final_url);
        self.body = Some(body);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), SessionError> {
        let parsed = Selector::parse(selector)
            .map_err(|_| SessionError::Selector(selector.to_string()))?;
        let deadline = Instant::now() + timeout;

        loop {
            if self.document_has(&parsed) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::SelectorTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;

            // Static documents only change if we fetch them again
            let url = self.url.clone().ok_or(SessionError::NoDocument)?;
            self.goto(&url).await?;
        }
    }

    fn document(&self) -> Result<&str, SessionError> {
        self.body.as_deref().ok_or(SessionError::NoDocument)
    }

    fn current_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
