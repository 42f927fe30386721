//! Class-name and text heuristics used by the block extractor

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a known language token in a class attribute, with an optional
/// highlighter prefix such as `language-rust` or `brush:python`
static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:language-|lang-|brush:)?(python|javascript|java|cpp|c\+\+|csharp|c#|php|ruby|go|rust|swift|kotlin|typescript|sql|bash|shell|html|css|json|xml|yaml)",
    )
    .expect("language pattern is valid")
});

/// Matches a bare image filename, e.g. `diagram-v2.png`
static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\w\-]+\.(?:png|jpg|jpeg|gif|svg|webp)$").expect("filename pattern is valid")
});

/// Class names used by syntax highlighters for line-number gutters
const LINE_NUMBER_CLASSES: [&str; 3] = ["pre-numbering", "line-numbers", "line-number"];

/// Extracts a language token from a class attribute value
///
/// Returns the lowercased token, or None when no known language appears.
pub fn language_from_classes(classes: &str) -> Option<String> {
    LANGUAGE_RE
        .captures(classes)
        .map(|captures| captures[1].to_lowercase())
}

/// Whether a class name marks a line-number gutter element
pub fn is_line_number_class(class: &str) -> bool {
    LINE_NUMBER_CLASSES.contains(&class)
}

/// Filter applied to every candidate text block: trimmed text must be
/// longer than 10 characters and not a bare image filename
pub fn passes_text_filter(text: &str) -> bool {
    text.chars().count() > 10 && !FILENAME_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_with_prefix() {
        assert_eq!(
            language_from_classes("language-python"),
            Some("python".to_string())
        );
        assert_eq!(
            language_from_classes("lang-rust highlighted"),
            Some("rust".to_string())
        );
        assert_eq!(
            language_from_classes("brush:sql"),
            Some("sql".to_string())
        );
    }

    #[test]
    fn test_language_bare_token() {
        assert_eq!(
            language_from_classes("hljs javascript"),
            Some("javascript".to_string())
        );
    }

    #[test]
    fn test_language_case_insensitive() {
        assert_eq!(
            language_from_classes("Language-Python"),
            Some("python".to_string())
        );
    }

    #[test]
    fn test_language_javascript_beats_java() {
        // Alternation order keeps the longer token from being cut short
        assert_eq!(
            language_from_classes("language-javascript"),
            Some("javascript".to_string())
        );
    }

    #[test]
    fn test_language_none_for_unknown() {
        assert_eq!(language_from_classes("prettyprint numbered"), None);
        assert_eq!(language_from_classes(""), None);
    }

    #[test]
    fn test_line_number_classes() {
        assert!(is_line_number_class("pre-numbering"));
        assert!(is_line_number_class("line-numbers"));
        assert!(is_line_number_class("line-number"));
        assert!(!is_line_number_class("code-body"));
    }

    #[test]
    fn test_text_filter_length() {
        assert!(!passes_text_filter("ten chars!"));
        assert!(passes_text_filter("eleven chars"));
    }

    #[test]
    fn test_text_filter_counts_chars_not_bytes() {
        // 11 CJK characters, far more than 10 bytes
        assert!(passes_text_filter("这是一段足够长的中文文本"));
    }

    #[test]
    fn test_text_filter_rejects_filenames() {
        assert!(!passes_text_filter("screenshot-2024.png"));
        assert!(!passes_text_filter("diagram_v2.JPEG"));
        assert!(passes_text_filter("see screenshot-2024.png for details"));
    }
}
