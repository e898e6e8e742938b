//! HTML parser for extracting anchors and the page title
//!
//! Used by the built-in [`HttpRenderer`](super::HttpRenderer). Every `<a>`
//! element is returned, in document order, with its raw attributes; deciding
//! which anchors to record is left to the link resolver.

use crate::crawler::renderer::{ElementLocator, RawAnchor};
use scraper::{Html, Selector};

/// Maximum characters kept from an anchor's text
pub const LINK_TEXT_MAX: usize = 250;

/// Maximum characters kept from a page title
pub const TITLE_MAX: usize = 300;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag), empty if missing
    pub title: String,

    /// Every `<a>` element, in document order
    pub anchors: Vec<RawAnchor>,
}

/// Parses HTML content and extracts anchors and the title
///
/// The element locator of each anchor is its index among all `<a>` elements
/// in the document.
///
/// # Example
///
/// ```
/// use site_link_audit::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.anchors[0].href.as_deref(), Some("/page"));
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        anchors: extract_anchors(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| sanitize_text(&element.text().collect::<String>(), TITLE_MAX))
        .unwrap_or_default()
}

/// Extracts every `<a>` element from the HTML document
fn extract_anchors(document: &Html) -> Vec<RawAnchor> {
    let Ok(a_selector) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .enumerate()
        .map(|(index, element)| {
            let attr = |name: &str| element.value().attr(name).map(str::to_string);
            RawAnchor {
                href: attr("href"),
                text: element.text().collect::<String>(),
                aria_label: attr("aria-label"),
                target: attr("target").unwrap_or_default(),
                rel: attr("rel").unwrap_or_default(),
                locator: ElementLocator(index),
            }
        })
        .collect()
}

/// Collapses runs of whitespace and truncates to `max` characters
pub fn sanitize_text(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > max {
        collapsed.chars().take(max).collect()
    } else {
        collapsed
    }
}
