//! Crawl statistics
//!
//! `CrawlStats` holds live counters updated by workers; `CrawlSummary` is the
//! immutable report produced when the run ends.

use crate::crawler::FinishReason;
use crate::state::UrlOutcome;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Live per-outcome counters shared by the worker pool
#[derive(Debug, Default)]
pub struct CrawlStats {
    recorded: AtomicUsize,
    disallowed: AtomicUsize,
    fetch_failed: AtomicUsize,
    sink_failed: AtomicUsize,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one processed URL and returns the new total for its outcome
    pub fn record(&self, outcome: UrlOutcome) -> usize {
        let counter = match outcome {
            UrlOutcome::Recorded => &self.recorded,
            UrlOutcome::Disallowed => &self.disallowed,
            UrlOutcome::FetchFailed => &self.fetch_failed,
            UrlOutcome::SinkFailed => &self.sink_failed,
        };
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self, outcome: UrlOutcome) -> usize {
        match outcome {
            UrlOutcome::Recorded => self.recorded.load(Ordering::SeqCst),
            UrlOutcome::Disallowed => self.disallowed.load(Ordering::SeqCst),
            UrlOutcome::FetchFailed => self.fetch_failed.load(Ordering::SeqCst),
            UrlOutcome::SinkFailed => self.sink_failed.load(Ordering::SeqCst),
        }
    }
}

/// Final report of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,

    /// How the crawl ended
    pub finish_reason: FinishReason,

    /// Size of the visited set: every URL ever admitted
    pub pages_visited: usize,

    /// Records handed to the output sink
    pub pages_recorded: usize,

    pub fetch_failures: usize,
    pub robots_denied: usize,

    /// Distinct hosts whose robots.txt was consulted
    pub robots_hosts: usize,
}

impl CrawlSummary {
    /// Pages per second over the whole run
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.pages_recorded as f64 / secs
    }

    /// Logs the summary at info level
    pub fn log(&self) {
        tracing::info!(
            "Crawl ended ({:?}) after {:.1}s: {} visited, {} recorded, {} fetch failures, {} disallowed by robots.txt, {} hosts",
            self.finish_reason,
            self.elapsed.as_secs_f64(),
            self.pages_visited,
            self.pages_recorded,
            self.fetch_failures,
            self.robots_denied,
            self.robots_hosts
        );
    }
}

/// Prints a human readable summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("\n=== Crawl Summary ===\n");
    println!("Started:  {}", summary.started_at.to_rfc3339());
    println!("Finished: {}", summary.finished_at.to_rfc3339());
    println!("Ended by: {:?}", summary.finish_reason);
    println!();
    println!("Pages visited:       {}", summary.pages_visited);
    println!("Records written:     {}", summary.pages_recorded);
    println!("Fetch failures:      {}", summary.fetch_failures);
    println!("Robots.txt denials:  {}", summary.robots_denied);
    println!("Hosts seen:          {}", summary.robots_hosts);
    println!("Rate:                {:.2} pages/sec", summary.rate());
    println!("\nCrawl finished. Visited {} pages.", summary.pages_visited);
}
