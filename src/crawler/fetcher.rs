//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `Downloader` trait the workers and the robots cache fetch through
//! - Building HTTP clients with the crawler's user agent and timeouts
//! - Error classification (non-200, timeout, connect failure, bad URL)
//!
//! Failed fetches are never retried.

use crate::config::{HttpConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use thiserror::Error;

/// Reasons a download produced no content
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Malformed URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
}

/// Downloads the body behind a URL
///
/// Implementations must be shareable across workers. Anything other than a
/// 200 response is reported as a `FetchError`.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Identification sent with every request
/// * `http` - Timeouts and redirect limit
///
/// # Example
///
/// ```no_run
/// use polite_crawler::config::{HttpConfig, UserAgentConfig};
/// use polite_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(http.request_timeout())
        .connect_timeout(http.connect_timeout())
        .redirect(Policy::limited(http.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Downloader` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(user_agent: &UserAgentConfig, http: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, http)?,
        })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    /// Fetches a URL, following redirects
    ///
    /// # Error classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Unparseable URL | `InvalidUrl` |
    /// | Any status other than 200 | `Status` |
    /// | Timeout | `Timeout` |
    /// | Connection refused, DNS, TLS | `Connect` |
    /// | Body read failure, other | `Network` |
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let target = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else if e.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
