//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the shared pieces together and drives one run:
//! - Validating configuration and opening the output sink
//! - Seeding the frontier
//! - Spawning the worker pool and an optional global deadline
//! - Waiting for every worker, closing the sink exactly once
//! - Producing the final `CrawlSummary`

use crate::config::{validate, Config};
use crate::crawler::frontier::{FinishReason, Frontier};
use crate::crawler::worker::{CrawlContext, Worker};
use crate::crawler::{Downloader, HttpDownloader};
use crate::output::{CrawlStats, CrawlSummary, FileSink, RecordSink};
use crate::robots::RobotsCache;
use crate::state::UrlOutcome;
use crate::CrawlerError;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinSet;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    ctx: Arc<CrawlContext>,
}

impl Coordinator {
    /// Creates a coordinator over the given downloader and sink
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration; validated here
    /// * `downloader` - Used for both page and robots.txt fetches
    /// * `sink` - Receives one record per fetched page; closed by `run`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlerError)` - Configuration is invalid
    pub fn new(
        config: Config,
        downloader: Arc<dyn Downloader>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, CrawlerError> {
        validate(&config)?;

        let robots = RobotsCache::new(Arc::clone(&downloader), config.user_agent.identity());
        let ctx = CrawlContext {
            frontier: Frontier::new(config.crawler.max_pages),
            robots,
            downloader,
            sink,
            stats: CrawlStats::new(),
            max_idle_wait: config.crawler.max_idle_wait(),
            sink_error: Mutex::new(None),
        };

        Ok(Self {
            config,
            ctx: Arc::new(ctx),
        })
    }

    /// Creates a coordinator with an HTTP downloader and a file sink
    ///
    /// The output file is opened here, before any worker starts.
    pub fn from_config(config: Config) -> Result<Self, CrawlerError> {
        validate(&config)?;

        let downloader = HttpDownloader::new(&config.user_agent, &config.http)?;
        let sink = FileSink::open(&config.output.path, config.output.format)?;
        tracing::info!(
            "Writing {} records to {}",
            config.output.format,
            config.output.path
        );

        Self::new(config, Arc::new(downloader), Arc::new(sink))
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.ctx.frontier
    }

    pub fn robots(&self) -> &RobotsCache {
        &self.ctx.robots
    }

    /// Handle for requesting cooperative shutdown from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            frontier: Arc::clone(&self.ctx.frontier),
        }
    }

    /// Runs the crawl to completion
    ///
    /// Returns once every worker has exited and the sink has been closed.
    /// A requested cancellation still yields `Ok` with
    /// `FinishReason::Cancelled`; a sink failure yields `Err`.
    pub async fn run(self) -> Result<CrawlSummary, CrawlerError> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let crawler = &self.config.crawler;
        let frontier = Arc::clone(&self.ctx.frontier);

        tracing::info!(
            "Starting crawl from {} with {} workers, max {} pages",
            crawler.seed_url,
            crawler.workers,
            crawler.max_pages
        );

        if !frontier.try_enqueue(&crawler.seed_url) {
            if let Err(e) = self.ctx.sink.close() {
                tracing::error!("Failed to close output after seed rejection: {}", e);
            }
            return Err(CrawlerError::SeedRejected(crawler.seed_url.clone()));
        }

        let mut workers = JoinSet::new();
        for id in 0..crawler.workers {
            workers.spawn(Worker::new(id, Arc::clone(&self.ctx)).run());
        }

        let deadline = crawler.crawl_timeout().map(|limit| {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::warn!("Crawl timeout of {:?} reached, stopping workers", limit);
                frontier.cancel();
            })
        });

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let closed = self.ctx.sink.close();
        if let Some(e) = self.ctx.take_sink_error() {
            return Err(CrawlerError::Output(e));
        }
        closed?;

        let snapshot = frontier.snapshot();
        let finish_reason = if frontier.is_cancelled() {
            FinishReason::Cancelled
        } else if snapshot.visited >= frontier.max_pages() {
            FinishReason::CapReached
        } else {
            FinishReason::Exhausted
        };

        let stats = &self.ctx.stats;
        let summary = CrawlSummary {
            started_at,
            finished_at: Utc::now(),
            elapsed: start_time.elapsed(),
            finish_reason,
            pages_visited: snapshot.visited,
            pages_recorded: stats.count(UrlOutcome::Recorded),
            fetch_failures: stats.count(UrlOutcome::FetchFailed),
            robots_denied: stats.count(UrlOutcome::Disallowed),
            robots_hosts: self.ctx.robots.cached_hosts(),
        };
        summary.log();

        Ok(summary)
    }
}

/// Requests cooperative shutdown of a running crawl
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    frontier: Arc<Frontier>,
}

impl ShutdownHandle {
    /// Stops admissions and wakes every worker; in-flight URLs are abandoned
    pub fn cancel(&self) {
        self.frontier.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.frontier.is_cancelled()
    }
}

/// Runs a complete crawl with the HTTP downloader and the configured file sink
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed (exhausted, capped or cancelled)
/// * `Err(CrawlerError)` - Startup failed or the sink failed mid-crawl
pub async fn run_crawl(config: Config) -> Result<CrawlSummary, CrawlerError> {
    Coordinator::from_config(config)?.run().await
}
