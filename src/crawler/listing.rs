//! Listing-page parsing
//!
//! Turns one listing document into article candidates plus the URL of
//! the next page, if a next-page control exists.

use crate::config::SourceConfig;
use scraper::{Html, Selector};
use url::Url;

const UNTITLED: &str = "Untitled";

/// One listing entry: where the article lives and what it calls itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    /// Numeric identifier parsed from the URL; None when not extractable
    pub article_id: Option<u64>,
}

/// Everything read off one listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub candidates: Vec<Candidate>,
    pub next_url: Option<String>,
}

/// Parses candidates and the next-page link out of a listing document
///
/// Relative hrefs are resolved against `base`. Entries without a link
/// are skipped; a missing title falls back to the link text and finally
/// to a placeholder.
pub fn parse_listing(html: &str, base: &Url, source: &SourceConfig) -> ListingPage {
    let document = Html::parse_document(html);

    let (Ok(item_selector), Ok(link_selector), Ok(title_selector)) = (
        Selector::parse(&source.item_selector),
        Selector::parse(&source.link_selector),
        Selector::parse(&source.title_selector),
    ) else {
        return ListingPage::default();
    };

    let mut candidates = Vec::new();
    for item in document.select(&item_selector) {
        let Some(link) = item.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(url) = base.join(href) else {
            tracing::debug!(href, "skipping unresolvable listing href");
            continue;
        };

        let mut title = item
            .select(&title_selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if title.is_empty() {
            title = link
                .text()
                .collect::<String>()
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string();
        }
        if title.is_empty() {
            title = UNTITLED.to_string();
        }

        let url = url.to_string();
        let article_id = parse_article_id(&url, &source.article_path_marker);
        candidates.push(Candidate {
            url,
            title,
            article_id,
        });
    }

    let next_url = find_next_page(&document, base, &source.next_page_label);

    ListingPage {
        candidates,
        next_url,
    }
}

/// Parses the numeric identifier that follows the path marker in a URL
///
/// Returns None when the marker is absent or the trailing segment is not
/// a clean number; such candidates are treated as always-eligible since
/// their age cannot be established.
pub fn parse_article_id(url: &str, marker: &str) -> Option<u64> {
    let (_, rest) = url.rsplit_once(marker)?;
    let id_part = rest.split(['/', '?', '#']).next()?;
    id_part.parse().ok()
}

/// Finds the next-page control by its link text
fn find_next_page(document: &Html, base: &Url, label: &str) -> Option<String> {
    let anchor_selector = Selector::parse("a, button").ok()?;
    for element in document.select(&anchor_selector) {
        let text = element.text().collect::<String>();
        if !text.trim().contains(label) {
            continue;
        }
        // A labelled control without a target cannot be followed
        if let Some(href) = element.value().attr("href") {
            return base.join(href).ok().map(|u| u.to_string());
        }
    }
    None
}
