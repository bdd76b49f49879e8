//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a href>` tags)
//! - Page title
//! - Page description (meta description, else first paragraph)

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Text of the `<title>` tag, trimmed; empty when absent
    pub title: String,

    /// Meta description, else first paragraph text, else empty
    pub description: String,

    /// All links found on the page (absolute URLs, document order)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags, resolved against `base_url`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Anything that does not resolve to an http(s) URL
///
/// # Example
///
/// ```
/// use polite_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    if html.trim().is_empty() {
        return ParsedPage::default();
    }

    let document = Html::parse_document(html);

    ParsedPage {
        title: title_of(&document),
        description: description_of(&document),
        links: links_of(&document, base_url),
    }
}

/// Extracts all followable absolute links from HTML content
///
/// Returns an empty list for empty content or an unparseable base URL.
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    match Url::parse(base_url) {
        Ok(base) => links_of(&Html::parse_document(html), &base),
        Err(e) => {
            tracing::debug!("Cannot resolve links against {}: {}", base_url, e);
            Vec::new()
        }
    }
}

/// Extracts the page title, or an empty string
pub fn extract_title(html: &str) -> String {
    title_of(&Html::parse_document(html))
}

/// Extracts the meta description, falling back to the first paragraph's text
pub fn extract_description(html: &str) -> String {
    description_of(&Html::parse_document(html))
}

fn title_of(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .unwrap_or_default()
}

fn description_of(document: &Html) -> String {
    if let Ok(meta_selector) = Selector::parse("meta[name][content]") {
        let meta = document.select(&meta_selector).find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
        });

        if let Some(content) = meta.and_then(|element| element.value().attr("content")) {
            let content = collapse_whitespace(content);
            if !content.is_empty() {
                return content;
            }
        }
    }

    let Ok(p_selector) = Selector::parse("p") else {
        return String::new();
    };

    document
        .select(&p_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .unwrap_or_default()
}

fn links_of(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Same page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
