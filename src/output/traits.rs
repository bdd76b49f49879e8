//! Output sink traits and types
//!
//! This module defines the trait interface for record sinks and the record
//! they receive.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Output sink is closed")]
    Closed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlRecord {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl CrawlRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Append-only destination for crawl records
///
/// Implementations are shared by every worker and must serialize writes so
/// records never interleave. `close` is called once, after all workers have
/// stopped, and must flush anything buffered.
pub trait RecordSink: Send + Sync {
    /// Appends one record and flushes it
    fn write_record(&self, record: &CrawlRecord) -> OutputResult<()>;

    /// Flushes and releases the sink; later writes fail with `OutputError::Closed`
    fn close(&self) -> OutputResult<()>;
}
