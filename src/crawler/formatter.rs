//! Article canonicalization
//!
//! Maps raw scraped fields plus extracted content blocks into the
//! canonical [`Article`] record: stable id, normalized date, derived
//! summary.

use crate::config::SourceConfig;
use crate::model::{Article, ContentBlock, ContentKind};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

const SUMMARY_CHARS: usize = 200;

/// Year-first date, with ASCII or CJK separators
static DATE_YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[.\-/年](\d{1,2})[.\-/月](\d{1,2})").expect("date pattern is valid")
});

/// Day-first date
static DATE_DMY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[.\-/](\d{1,2})[.\-/](\d{4})").expect("date pattern is valid")
});

/// Raw fields gathered for one article before canonicalization
#[derive(Debug, Clone)]
pub struct RawArticle {
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub publish_time: Option<String>,
    pub blocks: Vec<ContentBlock>,
}

/// Builds the canonical record for a raw scrape
pub fn format_article(raw: RawArticle, source: &SourceConfig) -> Article {
    let now = Utc::now();
    let id = article_id(&raw.url);
    let date = standardize_date(raw.publish_time.as_deref());
    let summary = derive_summary(&raw.blocks);

    Article {
        id,
        title: raw.title,
        date,
        url: raw.url,
        content: raw.blocks,
        category: source.category.clone(),
        summary,
        source: source.name.clone(),
        author: raw.author,
        created_at: now,
        updated_at: now,
    }
}

/// Deterministic article id: first 16 hex chars of SHA-256 of the URL
///
/// Depends on the URL alone, so re-ingesting the same URL always yields
/// the same id no matter what the content looks like.
pub fn article_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Normalizes a scraped date string to YYYY-MM-DD
///
/// Recognizes year-first dates with `.`/`-`/`/` or CJK separators and
/// day-first dates with ASCII separators. Anything else, including a
/// missing value, falls back to today.
pub fn standardize_date(raw: Option<&str>) -> String {
    let today = || Utc::now().format("%Y-%m-%d").to_string();

    let Some(raw) = raw else {
        return today();
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return today();
    }

    for pattern in [&*DATE_YMD_RE, &*DATE_DMY_RE] {
        if let Some(captures) = pattern.captures(raw) {
            let first: i64 = captures[1].parse().unwrap_or(0);
            let second: i64 = captures[2].parse().unwrap_or(0);
            let third: i64 = captures[3].parse().unwrap_or(0);
            let (year, month, day) = if first > 1900 {
                (first, second, third)
            } else {
                (third, second, first)
            };
            return format!("{year:04}-{month:02}-{day:02}");
        }
    }

    tracing::warn!(date = raw, "cannot parse date, using current date");
    today()
}

/// Summary is the first text block, capped at 200 characters
fn derive_summary(blocks: &[ContentBlock]) -> String {
    for block in blocks {
        if block.kind != ContentKind::Text || block.value.is_empty() {
            continue;
        }
        let mut summary: String = block.value.chars().take(SUMMARY_CHARS).collect();
        if block.value.chars().count() > SUMMARY_CHARS {
            summary.push_str("...");
        }
        return summary;
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_config() -> SourceConfig {
        let config: crate::config::Config = toml::from_str(
            r#"
[source]
base-url = "https://ost.example.com/postlist"
name = "ExampleTech"
category = "Engineering"
"#,
        )
        .unwrap();
        config.source
    }

    fn raw(url: &str, blocks: Vec<ContentBlock>) -> RawArticle {
        RawArticle {
            title: "A title".to_string(),
            url: url.to_string(),
            author: Some("someone".to_string()),
            publish_time: Some("2025-03-05".to_string()),
            blocks,
        }
    }

    #[test]
    fn test_id_is_deterministic_and_short() {
        let a = article_id("https://x/posts/1");
        let b = article_id("https://x/posts/1");
        let c = article_id("https://x/posts/2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_format_carries_source_fields() {
        let article = format_article(
            raw("https://x/posts/1", vec![ContentBlock::text("body text long enough")]),
            &source_config(),
        );
        assert_eq!(article.category, "Engineering");
        assert_eq!(article.source, "ExampleTech");
        assert_eq!(article.author.as_deref(), Some("someone"));
        assert_eq!(article.date, "2025-03-05");
        assert_eq!(article.id, article_id("https://x/posts/1"));
    }

    #[test]
    fn test_date_year_first_variants() {
        assert_eq!(standardize_date(Some("2025-03-05")), "2025-03-05");
        assert_eq!(standardize_date(Some("2025.3.5")), "2025-03-05");
        assert_eq!(standardize_date(Some("2025/03/05")), "2025-03-05");
        assert_eq!(standardize_date(Some("2025年3月5日")), "2025-03-05");
    }

    #[test]
    fn test_date_day_first() {
        assert_eq!(standardize_date(Some("05/03/2025")), "2025-03-05");
        assert_eq!(standardize_date(Some("5-3-2025")), "2025-03-05");
    }

    #[test]
    fn test_date_embedded_in_text() {
        assert_eq!(
            standardize_date(Some("published 2025-03-05 10:24")),
            "2025-03-05"
        );
    }

    #[test]
    fn test_date_fallback_is_today() {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(standardize_date(None), today);
        assert_eq!(standardize_date(Some("")), today);
        assert_eq!(standardize_date(Some("yesterday-ish")), today);
    }

    #[test]
    fn test_summary_from_first_text_block() {
        let blocks = vec![
            ContentBlock::image("https://cdn/x.png"),
            ContentBlock::text("the first real paragraph"),
            ContentBlock::text("a later paragraph"),
        ];
        let article = format_article(raw("https://x/posts/1", blocks), &source_config());
        assert_eq!(article.summary, "the first real paragraph");
    }

    #[test]
    fn test_summary_truncated_with_ellipsis() {
        let long = "x".repeat(250);
        let article = format_article(
            raw("https://x/posts/1", vec![ContentBlock::text(long)]),
            &source_config(),
        );
        assert_eq!(article.summary.chars().count(), 203);
        assert!(article.summary.ends_with("..."));
    }

    #[test]
    fn test_summary_exact_limit_not_truncated() {
        let exact = "y".repeat(200);
        let article = format_article(
            raw("https://x/posts/1", vec![ContentBlock::text(exact.clone())]),
            &source_config(),
        );
        assert_eq!(article.summary, exact);
    }

    #[test]
    fn test_summary_empty_without_text_blocks() {
        let article = format_article(
            raw("https://x/posts/1", vec![ContentBlock::image("https://cdn/x.png")]),
            &source_config(),
        );
        assert_eq!(article.summary, "");
    }
}
