//! HTML parser for extracting page metadata and links
//!
//! This module handles parsing HTML content to extract:
//! - Page title and description (the three output columns)
//! - Anchor links to follow, resolved and filtered to the crawl scope

use crate::url::{in_scope, normalize_url, CrawlTarget};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Title and description extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Trimmed text of the first `<title>`, or empty
    pub title: String,

    /// Meta description, or empty
    pub description: String,
}

/// Everything the crawl needs from one fetched page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Title and description
    pub metadata: PageMetadata,

    /// In-scope, normalized, de-duplicated links in document order
    pub links: Vec<Url>,
}

/// Parses a page once and extracts both metadata and links
pub fn parse_page(html: &str, base_url: &Url, target: &CrawlTarget) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        metadata: metadata_from_document(&document),
        links: links_from_document(&document, base_url, target),
    }
}

/// Extracts title and description from an HTML document
///
/// # Description Priority
///
/// 1. `<meta name="description">` if its content is non-empty
/// 2. `<meta property="og:description">` if its content is non-empty
/// 3. Empty
///
/// Only one source is ever used; the values are not merged.
///
/// # Example
///
/// ```
/// use meta_crawl::crawler::extract_metadata;
///
/// let html = r#"<title> Home </title><meta property="og:description" content="Social text">"#;
/// let meta = extract_metadata(html);
/// assert_eq!(meta.title, "Home");
/// assert_eq!(meta.description, "Social text");
/// ```
pub fn extract_metadata(html: &str) -> PageMetadata {
    metadata_from_document(&Html::parse_document(html))
}

fn metadata_from_document(document: &Html) -> PageMetadata {
    PageMetadata {
        title: extract_title(document),
        description: extract_description(document),
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
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_description(document: &Html) -> String {
    meta_content(document, "name", "description")
        .or_else(|| meta_content(document, "property", "og:description"))
        .unwrap_or_default()
}

/// Content of the first `<meta>` whose `attr` equals `value` (case-insensitive)
/// and whose content is non-empty after trimming
fn meta_content(document: &Html, attr: &str, value: &str) -> Option<String> {
    let meta_selector = Selector::parse("meta[content]").ok()?;

    document
        .select(&meta_selector)
        .filter(|element| attr_matches(element, attr, value))
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn attr_matches(element: &ElementRef<'_>, attr: &str, value: &str) -> bool {
    element
        .value()
        .attr(attr)
        .map(|v| v.trim().eq_ignore_ascii_case(value))
        .unwrap_or(false)
}

/// Extracts crawlable links from an HTML document
///
/// Every `<a href>` is resolved against `base_url` and normalized. Links
/// that fail to parse or fall outside the crawl target are discarded, as
/// are anchors carrying a `download` attribute. Duplicates collapse; the
/// remaining links keep document order so that breadth-first traversal is
/// deterministic.
///
/// # Example
///
/// ```
/// use meta_crawl::crawler::extract_links;
/// use meta_crawl::url::CrawlTarget;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let target = CrawlTarget::from_seed(&base).unwrap();
/// let html = r#"<a href="/about">About</a><a href="https://other.com/">Other</a>"#;
/// let links = extract_links(html, &base, &target);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/about");
/// ```
pub fn extract_links(html: &str, base_url: &Url, target: &CrawlTarget) -> Vec<Url> {
    links_from_document(&Html::parse_document(html), base_url, target)
}

fn links_from_document(document: &Html, base_url: &Url, target: &CrawlTarget) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let url = match normalize_url(href, base_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Discarding link {:?} on {}: {}", href, base_url, e);
                continue;
            }
        };

        if !in_scope(&url, target) {
            continue;
        }

        if seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    }

    links
}
