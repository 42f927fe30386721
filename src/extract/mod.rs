//! Content-block extraction
//!
//! Turns a raw article content container into an ordered sequence of typed
//! content blocks (text, image, code), preserving document order. The
//! traversal applies one rule per node, first match wins:
//!
//! - script/style/noscript subtrees are skipped entirely
//! - images become `image` blocks when their source is scheme-qualified
//! - pre/code nodes become one `code` block each, with line-number
//!   gutters stripped and a best-effort language from class names
//! - headings and paragraphs with nested images or code recurse so mixed
//!   content splits correctly; plain ones become a single `text` block
//! - other containers recurse into their children
//! - bare text nodes become `text` blocks under the same filters
//!
//! If the traversal produces nothing, the container's flattened text is
//! used as a single `text` block; when that is also empty the result is
//! an empty sequence and the caller treats extraction as failed.

mod heuristics;

pub use heuristics::{language_from_classes, passes_text_filter};

use crate::model::ContentBlock;
use heuristics::is_line_number_class;
use once_cell::sync::Lazy;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};

static CODE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("code").expect("static selector is valid"));
static MIXED_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img, pre, code").expect("static selector is valid"));

/// Extracts content blocks from a full document given the container selector
///
/// Returns an empty sequence when the container is missing or yields no
/// usable content.
pub fn extract_article_blocks(html: &str, content_selector: &str) -> Vec<ContentBlock> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse(content_selector) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };
    match document.select(&selector).next() {
        Some(root) => extract_blocks(root),
        None => Vec::new(),
    }
}

/// Extracts content blocks from a content root element
pub fn extract_blocks(root: ElementRef) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    process_element(root, &mut blocks);

    if blocks.is_empty() {
        // Structured traversal found nothing; fall back to flattened text
        let flat = root.text().collect::<String>();
        let flat = flat.trim();
        if !flat.is_empty() {
            blocks.push(ContentBlock::text(flat));
        }
    }

    blocks
}

fn process_element(element: ElementRef, blocks: &mut Vec<ContentBlock>) {
    match element.value().name() {
        "script" | "style" | "noscript" => {}

        "img" => {
            if let Some(src) = image_source(element.value()) {
                blocks.push(ContentBlock::image(src));
            }
        }

        "pre" | "code" => {
            let text = code_text(element);
            if !text.is_empty() {
                let language = detect_language(element);
                blocks.push(ContentBlock::code(text, language));
            }
        }

        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            if element.select(&MIXED_SELECTOR).next().is_some() {
                // Mixed content: split into per-child blocks
                recurse_children(element, blocks);
            } else {
                emit_text(&element.text().collect::<String>(), blocks);
            }
        }

        _ => recurse_children(element, blocks),
    }
}

fn recurse_children(element: ElementRef, blocks: &mut Vec<ContentBlock>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => emit_text(text, blocks),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    process_element(child_element, blocks);
                }
            }
            _ => {}
        }
    }
}

fn emit_text(raw: &str, blocks: &mut Vec<ContentBlock>) {
    let text = raw.trim();
    if passes_text_filter(text) {
        blocks.push(ContentBlock::text(text));
    }
}

/// Resolves an image source, accepting lazy-load attributes, and keeps
/// only scheme-qualified URLs
fn image_source(element: &Element) -> Option<String> {
    let src = element
        .attr("src")
        .filter(|s| !s.is_empty())
        .or_else(|| element.attr("data-src").filter(|s| !s.is_empty()))
        .or_else(|| element.attr("data-original").filter(|s| !s.is_empty()))?;
    if src.starts_with("http") {
        Some(src.to_string())
    } else {
        None
    }
}

/// Collects the text of a code node with line-number gutters removed
fn code_text(element: ElementRef) -> String {
    let mut buffer = String::new();
    collect_code_text(element, &mut buffer);
    buffer.trim().to_string()
}

fn collect_code_text(element: ElementRef, buffer: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buffer.push_str(text),
            Node::Element(child_element) => {
                if child_element.classes().any(is_line_number_class) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_code_text(child_ref, buffer);
                }
            }
            _ => {}
        }
    }
}

/// Best-effort language detection for a code node
///
/// Checks the node's own class attribute first; for a `pre` wrapper with
/// no match, falls back to the class of a nested `code` element. Returns
/// an empty string when nothing is recognized.
fn detect_language(element: ElementRef) -> String {
    if let Some(language) = language_from_classes(element.value().attr("class").unwrap_or("")) {
        return language;
    }

    if element.value().name() == "pre" {
        if let Some(code) = element.select(&CODE_SELECTOR).next() {
            if let Some(language) =
                language_from_classes(code.value().attr("class").unwrap_or(""))
            {
                return language;
            }
        }
    }

    String::new()
}
