//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The downloader seam and its HTTP implementation
//! - HTML parsing, link and metadata extraction
//! - The shared frontier and its termination protocol
//! - The worker pool and overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod worker;

pub use coordinator::{run_crawl, Coordinator, ShutdownHandle};
pub use fetcher::{build_http_client, Downloader, FetchError, HttpDownloader};
pub use frontier::{ClaimedUrl, Dequeue, FinishReason, Frontier, FrontierSnapshot};
pub use parser::{extract_description, extract_links, extract_title, parse_html, ParsedPage};

pub use crate::output::CrawlSummary;
