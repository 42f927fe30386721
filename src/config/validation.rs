use crate::config::types::Config;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates a parsed configuration
///
/// Rejects configurations the pipeline could not run with: unparsable
/// URLs or selectors, zero-sized batches, and inverted delay ranges.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source(config)?;
    validate_crawler(config)?;
    validate_output(config)?;
    Ok(())
}

fn validate_source(config: &Config) -> Result<(), ConfigError> {
    let source = &config.source;

    let url = Url::parse(&source.base_url)
        .map_err(|_| ConfigError::InvalidUrl(source.base_url.clone()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(source.base_url.clone()));
    }

    if source.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source name must not be empty".to_string(),
        ));
    }
    if source.category.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source category must not be empty".to_string(),
        ));
    }
    if source.next_page_label.trim().is_empty() {
        return Err(ConfigError::Validation(
            "next-page-label must not be empty".to_string(),
        ));
    }

    let selectors = [
        &source.listing_selector,
        &source.item_selector,
        &source.link_selector,
        &source.title_selector,
        &source.content_selector,
    ];
    for selector in selectors {
        check_selector(selector)?;
    }
    for selector in source.author_selectors.iter().chain(&source.time_selectors) {
        check_selector(selector)?;
    }

    Ok(())
}

fn validate_crawler(config: &Config) -> Result<(), ConfigError> {
    let crawler = &config.crawler;

    if crawler.batch_size == 0 {
        return Err(ConfigError::Validation(
            "batch-size must be at least 1".to_string(),
        ));
    }
    if crawler.retry_attempts == 0 {
        return Err(ConfigError::Validation(
            "retry-attempts must be at least 1".to_string(),
        ));
    }
    if crawler.crawl_workers == 0 {
        return Err(ConfigError::Validation(
            "crawl-workers must be at least 1".to_string(),
        ));
    }
    if let Some(0) = crawler.max_pages {
        return Err(ConfigError::Validation(
            "max-pages must be at least 1 when set".to_string(),
        ));
    }

    let ranges = [
        ("article-delay", crawler.article_delay_min_ms, crawler.article_delay_max_ms),
        ("page-delay", crawler.page_delay_min_ms, crawler.page_delay_max_ms),
        ("retry-delay", crawler.retry_delay_min_ms, crawler.retry_delay_max_ms),
    ];
    for (name, min, max) in ranges {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "{name} range is inverted: min {min}ms > max {max}ms"
            )));
        }
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ConfigError> {
    if config.output.data_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "data-path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn check_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector(selector.to_string()))?;
    Ok(())
}
