//! Crawl worker
//!
//! Each worker loops: claim a URL from the frontier (or wait), check
//! robots.txt, fetch, extract metadata and links, write the record, enqueue
//! the links, release the claim. The claim is released only after every
//! child link has been offered to the frontier, so peers never see "queue
//! empty, nobody active" while children are still on their way in.

use crate::crawler::frontier::{Dequeue, FinishReason, Frontier};
use crate::crawler::parser::parse_html;
use crate::crawler::Downloader;
use crate::output::{CrawlRecord, CrawlStats, OutputError, RecordSink};
use crate::robots::RobotsCache;
use crate::state::{UrlOutcome, WorkerState};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Everything the pool shares
pub(crate) struct CrawlContext {
    pub frontier: Arc<Frontier>,
    pub robots: RobotsCache,
    pub downloader: Arc<dyn Downloader>,
    pub sink: Arc<dyn RecordSink>,
    pub stats: CrawlStats,
    pub max_idle_wait: Duration,

    /// First output failure; once set the crawl is cancelled
    pub sink_error: Mutex<Option<OutputError>>,
}

impl CrawlContext {
    fn fail_output(&self, error: OutputError) {
        let mut slot = self
            .sink_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
        drop(slot);
        self.frontier.cancel();
    }

    pub fn take_sink_error(&self) -> Option<OutputError> {
        self.sink_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

pub(crate) struct Worker {
    id: usize,
    ctx: Arc<CrawlContext>,
    state: WorkerState,
}

impl Worker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>) -> Self {
        Self {
            id,
            ctx,
            state: WorkerState::Idle,
        }
    }

    /// Runs until the frontier reports the crawl finished
    ///
    /// Returns the number of URLs this worker processed.
    pub async fn run(mut self) -> usize {
        let frontier = Arc::clone(&self.ctx.frontier);
        let mut processed = 0;

        loop {
            if frontier.is_cancelled() {
                self.advance(WorkerState::Terminated);
                break;
            }

            if !self.advance(WorkerState::Acquiring) {
                break;
            }

            let notified = frontier.work_changed();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match frontier.try_dequeue() {
                Dequeue::Claimed(claim) => {
                    if !self.advance(WorkerState::Active) {
                        break;
                    }

                    let outcome = tokio::select! {
                        biased;
                        _ = frontier.cancelled() => None,
                        outcome = self.process(claim.url()) => Some(outcome),
                    };

                    // Releases the active count after all child enqueues
                    drop(claim);

                    match outcome {
                        Some(outcome) => {
                            processed += 1;
                            self.count(outcome);
                            if !self.advance(WorkerState::Idle) {
                                break;
                            }
                        }
                        None => {
                            tracing::debug!("Worker {} interrupted mid-page", self.id);
                            self.advance(WorkerState::Terminated);
                            break;
                        }
                    }
                }
                Dequeue::Empty => {
                    if !self.advance(WorkerState::Idle) {
                        break;
                    }
                    // Bounded so a missed wake-up cannot stall the worker
                    let _ = tokio::time::timeout(self.ctx.max_idle_wait, notified).await;
                }
                Dequeue::Finished(reason) => {
                    if reason == FinishReason::CapReached {
                        tracing::trace!("Worker {} sees page cap reached", self.id);
                    }
                    self.advance(WorkerState::Terminated);
                    break;
                }
            }
        }

        tracing::debug!("Worker {} finished after {} URL(s)", self.id, processed);
        processed
    }

    fn advance(&mut self, next: WorkerState) -> bool {
        match self.state.transition(next) {
            Ok(state) => {
                tracing::trace!("Worker {}: {} -> {}", self.id, self.state, state);
                self.state = state;
                true
            }
            Err(e) => {
                tracing::error!("Worker {}: {}", self.id, e);
                self.state = WorkerState::Terminated;
                false
            }
        }
    }

    fn count(&self, outcome: UrlOutcome) {
        let total = self.ctx.stats.record(outcome);
        if outcome == UrlOutcome::Recorded && total % 10 == 0 {
            let snapshot = self.ctx.frontier.snapshot();
            tracing::info!(
                "Progress: {} pages recorded, {} visited, {} in frontier, {} active",
                total,
                snapshot.visited,
                snapshot.queued,
                snapshot.active
            );
        }
    }

    /// Processes one claimed URL
    ///
    /// No lock is held here; every step is either an await on I/O or a
    /// short critical section inside the frontier or the sink.
    async fn process(&self, url: &str) -> UrlOutcome {
        tracing::debug!("Worker {} crawling: {}", self.id, url);

        if !self.ctx.robots.is_allowed(url).await {
            tracing::debug!("Disallowed by robots.txt: {}", url);
            return UrlOutcome::Disallowed;
        }

        let body = match self.ctx.downloader.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", url, e);
                return UrlOutcome::FetchFailed;
            }
        };

        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Malformed URL {}: {}", url, e);
                return UrlOutcome::FetchFailed;
            }
        };
        let page = parse_html(&body, &base);

        let record = CrawlRecord::new(url, page.title, page.description);
        if let Err(e) = self.ctx.sink.write_record(&record) {
            tracing::error!("Failed to write record for {}: {}", url, e);
            self.ctx.fail_output(e);
            return UrlOutcome::SinkFailed;
        }

        let admitted = self.ctx.frontier.try_enqueue_all(&page.links);
        tracing::debug!(
            "{}: {} link(s) found, {} new",
            url,
            page.links.len(),
            admitted
        );

        UrlOutcome::Recorded
    }
}
