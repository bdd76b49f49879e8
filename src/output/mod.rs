//! Output module for crawl records and reports
//!
//! This module handles:
//! - The `RecordSink` seam workers write `CrawlRecord`s through
//! - A file sink (CSV or JSON lines) and an in-memory sink
//! - Crawl statistics and the end-of-run summary

mod file;
mod memory;
pub mod stats;
mod traits;

pub use file::{FileSink, OutputFormat};
pub use memory::MemorySink;
pub use stats::{print_summary, CrawlStats, CrawlSummary};
pub use traits::{CrawlRecord, OutputError, OutputResult, RecordSink};
