//! HTML fragment extraction for exported documents
//!
//! Each document's stored HTML is reduced to two fragments: the `<head>`
//! sub-tree and the article body selected by a configurable CSS selector.
//! When the selector matches nothing (or matches an empty element), the
//! caller falls back to the raw document unchanged rather than wrapping a
//! constructed one.
//!
//! Extraction is a pure function of its inputs. Every call parses the HTML
//! independently, so concurrent workers never share parser state.

use std::sync::LazyLock;

use scraper::{Html, Selector};

static HEAD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head").expect("static selector"));

/// Result of extracting content from a raw HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedContent {
    /// A non-empty article body was found; `head` and `body` are the inner
    /// HTML of the `<head>` element and of the selected element.
    Fragment { head: String, body: String },

    /// The selector matched nothing, or matched an empty element. The raw
    /// document must be used unmodified as the output content.
    RawFallback,
}

/// Extract the head and article-body fragments from a raw HTML document
///
/// # Arguments
/// * `raw_html` - The document's stored HTML
/// * `body_selector` - Selector for the article body element
///
/// # Returns
/// * `ExtractedContent` - Fragments, or the fallback sentinel
pub fn extract(raw_html: &str, body_selector: &Selector) -> ExtractedContent {
    let document = Html::parse_document(raw_html);

    let body = match document.select(body_selector).next() {
        Some(element) => element.inner_html(),
        None => return ExtractedContent::RawFallback,
    };

    // An empty selection is treated the same as no selection at all.
    if body.is_empty() {
        return ExtractedContent::RawFallback;
    }

    let head = document
        .select(&HEAD_SELECTOR)
        .next()
        .map(|element| element.inner_html())
        .unwrap_or_default();

    ExtractedContent::Fragment { head, body }
}

/// Compose the minimal wrapping document around extracted fragments
///
/// The template embeds the extracted head and body as sibling elements, in
/// that order, inside a single root element. The whitespace layout is part
/// of the output format and must stay stable.
///
/// # Arguments
/// * `head` - Inner HTML of the original `<head>`
/// * `body` - Inner HTML of the selected article body
///
/// # Returns
/// * `String` - The wrapping document
pub fn compose_document(head: &str, body: &str) -> String {
    format!("<html>\n<head>\n\t\t{head}\n\t</head>\n\t<body>\n{body}\n</body>\n</html>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(expr: &str) -> Selector {
        Selector::parse(expr).unwrap()
    }

    #[test]
    fn test_extract_body_fragment() {
        let html = "<html><head><title>T</title></head>\
                    <body><div id=\"article\"><p>hello</p></div></body></html>";
        let result = extract(html, &selector("#article"));

        match result {
            ExtractedContent::Fragment { head, body } => {
                assert_eq!(head, "<title>T</title>");
                assert_eq!(body, "<p>hello</p>");
            }
            ExtractedContent::RawFallback => panic!("expected a fragment"),
        }
    }

    #[test]
    fn test_extract_whole_body_by_default_selector() {
        let html = "<html><body><p>content</p></body></html>";
        let result = extract(html, &selector("body"));
        assert!(matches!(result, ExtractedContent::Fragment { .. }));
    }

    #[test]
    fn test_fallback_on_missing_selector() {
        let html = "<html><body><p>content</p></body></html>";
        let result = extract(html, &selector("#missing"));
        assert_eq!(result, ExtractedContent::RawFallback);
    }

    #[test]
    fn test_fallback_on_empty_selection() {
        let html = "<html><body></body></html>";
        let result = extract(html, &selector("body"));
        assert_eq!(result, ExtractedContent::RawFallback);
    }

    #[test]
    fn test_fallback_on_empty_matched_element() {
        let html = "<html><body><div id=\"article\"></div><p>after</p></body></html>";
        let result = extract(html, &selector("#article"));
        assert_eq!(result, ExtractedContent::RawFallback);
    }

    #[test]
    fn test_missing_head_yields_empty_head_fragment() {
        // html5ever inserts an empty head element during parsing
        let html = "<html><body><p>no head</p></body></html>";
        match extract(html, &selector("body")) {
            ExtractedContent::Fragment { head, .. } => assert_eq!(head, ""),
            ExtractedContent::RawFallback => panic!("expected a fragment"),
        }
    }

    #[test]
    fn test_compose_document_template() {
        let composed = compose_document("<title>T</title>", "<p>body</p>");
        assert_eq!(
            composed,
            "<html>\n<head>\n\t\t<title>T</title>\n\t</head>\n\t<body>\n<p>body</p>\n</body>\n</html>"
        );
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let html = "<html><head><title>T</title></head><body><p>x</p></body></html>";
        let sel = selector("body");
        let first = extract(html, &sel);
        let second = extract(html, &sel);
        assert_eq!(first, second);
    }
}
