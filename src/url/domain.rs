use url::Url;

/// Extracts the host key used to partition per-host state
///
/// The key is the lowercase host. A plain `http` URL with an explicit
/// non-default port keeps `:port`, since robots.txt is always fetched over
/// http and that port serves it. Any other port is dropped so the key
/// resolves to `http://{host}/robots.txt`.
///
/// # Returns
///
/// * `Some(String)` - The host key
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_crawler::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
///
/// let url = Url::parse("https://example.com:8443/").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) if url.scheme() == "http" => Some(format!("{}:{}", host, port)),
        _ => Some(host),
    }
}
