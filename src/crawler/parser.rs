//! HTML parser for extracting links
//!
//! This module handles parsing HTML content to extract the links to follow
//! (from <a> tags and canonical links), resolved against the page URL.

use crate::url::normalize_link;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Link extraction capability
///
/// Implementations return absolute http(s) URLs, in document order.
pub trait Parser: Send + Sync {
    /// Extracts the links of `content`, resolving relative hrefs against `base_url`
    fn parse(&self, base_url: &Url, content: &str) -> Result<Vec<Url>, String>;
}

/// scraper-backed HTML link extractor
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<link rel="stylesheet" ...>`, `<script src="...">`, `<img src="...">`
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// `rel="nofollow"` links are followed. Fragments are stripped and repeated
/// links on a page are reported once.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for HtmlParser {
    fn parse(&self, base_url: &Url, content: &str) -> Result<Vec<Url>, String> {
        let document = Html::parse_document(content);
        extract_links(&document, base_url)
    }
}

/// Extracts all valid links from the HTML document
///
/// # Example
///
/// ```no_run
/// use polite_crawler::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = parse_links(html, &base_url).unwrap();
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_links(html: &str, base_url: &Url) -> Result<Vec<Url>, String> {
    HtmlParser::new().parse(base_url, html)
}

fn extract_links(document: &Html, base_url: &Url) -> Result<Vec<Url>, String> {
    let a_selector = Selector::parse("a[href]").map_err(|e| e.to_string())?;
    let canonical_selector =
        Selector::parse("link[rel='canonical'][href]").map_err(|e| e.to_string())?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let anchors = document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none());
    let canonicals = document.select(&canonical_selector);

    for element in anchors.chain(canonicals) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(absolute_url) = resolve_link(href, base_url) {
            if seen.insert(absolute_url.as_str().to_string()) {
                links.push(absolute_url);
            }
        }
    }

    Ok(links)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base_url.join(href).ok().and_then(normalize_link)
}
