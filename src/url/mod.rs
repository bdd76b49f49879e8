//! URL handling module for Polite-Crawler
//!
//! URLs are compared by exact string identity everywhere in the crawler; this
//! module only decomposes them into the host key and path that robots.txt
//! checks need.

mod domain;

pub use domain::extract_host;

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a crawl target, accepting only absolute http(s) URLs with a host
pub fn parse_target(url: &str) -> UrlResult<Url> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if parsed.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(parsed)
}

/// Splits a URL into its host key and path
///
/// # Examples
///
/// ```
/// use polite_crawler::url::host_and_path;
///
/// let (host, path) = host_and_path("https://example.com/private/x?y=1").unwrap();
/// assert_eq!(host, "example.com");
/// assert_eq!(path, "/private/x");
/// ```
pub fn host_and_path(url: &str) -> UrlResult<(String, String)> {
    let parsed = parse_target(url)?;
    let host = extract_host(&parsed).ok_or(UrlError::MissingHost)?;
    Ok((host, parsed.path().to_string()))
}

/// The robots.txt location for a host key
pub fn robots_url(host: &str) -> String {
    format!("http://{}/robots.txt", host)
}
