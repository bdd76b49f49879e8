use crate::output::OutputFormat;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Polite-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// The URL the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Number of concurrent workers
    pub workers: usize,

    /// Ceiling on the number of URLs ever admitted to the frontier
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Upper bound on how long an idle worker sleeps before re-checking
    /// the frontier (milliseconds)
    #[serde(rename = "max-idle-wait-ms")]
    pub max_idle_wait_ms: u64,

    /// Optional global deadline after which the crawl is cancelled
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            workers: 10,
            max_pages: 1300,
            max_idle_wait_ms: 250,
            crawl_timeout_secs: None,
        }
    }
}

impl CrawlerConfig {
    pub fn max_idle_wait(&self) -> Duration {
        Duration::from_millis(self.max_idle_wait_ms)
    }

    pub fn crawl_timeout(&self) -> Option<Duration> {
        self.crawl_timeout_secs.map(Duration::from_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PoliteCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// The identity string matched against robots.txt `User-agent:` lines,
    /// formatted as `Name/Version`
    pub fn identity(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }

    /// The value sent in the `User-Agent` header
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!("{} (+{})", self.identity(), contact),
            None => self.identity(),
        }
    }
}

/// HTTP timeout and redirect policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the record file (opened in append mode)
    pub path: String,

    /// Record encoding
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "results.csv".to_string(),
            format: OutputFormat::Csv,
        }
    }
}
