use serde::Deserialize;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the listing lives and how to read it
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL of the first listing page
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Source name recorded on every article
    pub name: String,

    /// Category recorded on every article
    pub category: String,

    /// Selector for the listing container
    #[serde(rename = "listing-selector", default = "default_listing_selector")]
    pub listing_selector: String,

    /// Selector for one listing entry
    #[serde(rename = "item-selector", default = "default_item_selector")]
    pub item_selector: String,

    /// Selector for the article link inside an entry
    #[serde(rename = "link-selector", default = "default_link_selector")]
    pub link_selector: String,

    /// Selector for the title inside an entry
    #[serde(rename = "title-selector", default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for the article content container
    #[serde(rename = "content-selector", default = "default_content_selector")]
    pub content_selector: String,

    /// Author selectors, tried in order, first non-empty match wins
    #[serde(rename = "author-selectors", default = "default_author_selectors")]
    pub author_selectors: Vec<String>,

    /// Publish-time selectors, tried in order, first non-empty match wins
    #[serde(rename = "time-selectors", default = "default_time_selectors")]
    pub time_selectors: Vec<String>,

    /// Link text of the next-page control
    #[serde(rename = "next-page-label", default = "default_next_page_label")]
    pub next_page_label: String,

    /// Path marker preceding the numeric article identifier in URLs
    #[serde(rename = "article-path-marker", default = "default_article_path_marker")]
    pub article_path_marker: String,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Floor identifier; candidates at or below it are considered historical
    #[serde(rename = "min-article-id", default)]
    pub min_article_id: u64,

    /// Upper bound on listing pages per run, unbounded when absent
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Articles accumulated before a flush to storage and cache
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Total attempts per article before it is skipped
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// How long to wait for a selector to appear (milliseconds)
    #[serde(rename = "selector-timeout-ms", default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// Pacing delay between articles on the same page (milliseconds)
    #[serde(rename = "article-delay-min-ms", default = "default_article_delay_min_ms")]
    pub article_delay_min_ms: u64,
    #[serde(rename = "article-delay-max-ms", default = "default_article_delay_max_ms")]
    pub article_delay_max_ms: u64,

    /// Pacing delay before turning a page (milliseconds)
    #[serde(rename = "page-delay-min-ms", default = "default_page_delay_min_ms")]
    pub page_delay_min_ms: u64,
    #[serde(rename = "page-delay-max-ms", default = "default_page_delay_max_ms")]
    pub page_delay_max_ms: u64,

    /// Delay between retry attempts for one article (milliseconds)
    #[serde(rename = "retry-delay-min-ms", default = "default_retry_delay_min_ms")]
    pub retry_delay_min_ms: u64,
    #[serde(rename = "retry-delay-max-ms", default = "default_retry_delay_max_ms")]
    pub retry_delay_max_ms: u64,

    /// Size of the background worker pool for crawl runs
    #[serde(rename = "crawl-workers", default = "default_crawl_workers")]
    pub crawl_workers: usize,
}

/// Document session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Connect timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Re-check interval while waiting for a selector (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON article file
    #[serde(rename = "data-path", default = "default_data_path")]
    pub data_path: String,
}

fn default_listing_selector() -> String {
    "ul.infinite-list".to_string()
}

fn default_item_selector() -> String {
    "ul.infinite-list > li".to_string()
}

fn default_link_selector() -> String {
    "a[href*='posts']".to_string()
}

fn default_title_selector() -> String {
    "h3.title-h3".to_string()
}

fn default_content_selector() -> String {
    ".posts-content".to_string()
}

fn default_author_selectors() -> Vec<String> {
    vec![
        ".name".to_string(),
        ".author".to_string(),
        ".post-author".to_string(),
    ]
}

fn default_time_selectors() -> Vec<String> {
    vec![
        "time".to_string(),
        ".publish-time".to_string(),
        ".post-time".to_string(),
    ]
}

fn default_next_page_label() -> String {
    "下一页".to_string()
}

fn default_article_path_marker() -> String {
    "/posts/".to_string()
}

fn default_batch_size() -> usize {
    5
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_selector_timeout_ms() -> u64 {
    20_000
}

fn default_article_delay_min_ms() -> u64 {
    2_000
}

fn default_article_delay_max_ms() -> u64 {
    5_000
}

fn default_page_delay_min_ms() -> u64 {
    3_000
}

fn default_page_delay_max_ms() -> u64 {
    6_000
}

fn default_retry_delay_min_ms() -> u64 {
    2_000
}

fn default_retry_delay_max_ms() -> u64 {
    3_000
}

fn default_crawl_workers() -> usize {
    2
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
        .to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_data_path() -> String {
    "data/articles.json".to_string()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_article_id: 0,
            max_pages: None,
            batch_size: default_batch_size(),
            retry_attempts: default_retry_attempts(),
            selector_timeout_ms: default_selector_timeout_ms(),
            article_delay_min_ms: default_article_delay_min_ms(),
            article_delay_max_ms: default_article_delay_max_ms(),
            page_delay_min_ms: default_page_delay_min_ms(),
            page_delay_max_ms: default_page_delay_max_ms(),
            retry_delay_min_ms: default_retry_delay_min_ms(),
            retry_delay_max_ms: default_retry_delay_max_ms(),
            crawl_workers: default_crawl_workers(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
        }
    }
}
