//! Shared crawl frontier
//!
//! One mutex guards the FIFO queue, the visited set and the active-worker
//! count, so the two compound operations the termination protocol relies on
//! are single critical sections:
//!
//! - enqueue: "not visited and under the page cap" check + visited insert + push
//! - dequeue: pop + active-count increment
//!
//! Idle workers park on a `Notify` that is woken on every successful enqueue
//! and whenever the active count drops to zero. They register interest before
//! looking at the queue, so a wake-up sent between "saw empty" and "started
//! waiting" is not lost; the wait is still bounded by the caller.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Why the frontier reported the crawl as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Queue empty and no worker processing a URL
    Exhausted,

    /// Queue empty and the page cap leaves no room for further admissions
    CapReached,

    /// Shutdown was requested
    Cancelled,
}

/// Result of `Frontier::try_dequeue`
#[derive(Debug)]
pub enum Dequeue {
    /// A URL was claimed; the worker counts as active until the claim drops
    Claimed(ClaimedUrl),

    /// Nothing queued right now, but an active worker may still add more
    Empty,

    /// No further work can appear
    Finished(FinishReason),
}

/// Point-in-time view of the shared state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierSnapshot {
    pub queued: usize,
    pub visited: usize,
    pub active: usize,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    active: usize,
}

/// Work queue, visited set and active-worker count shared by the pool
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    max_pages: usize,
    cancelled: AtomicBool,

    /// Woken on enqueue, on active count reaching zero, and on cancel
    work_changed: Notify,

    /// Woken on cancel only
    shutdown: Notify,
}

impl Frontier {
    pub fn new(max_pages: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FrontierState::default()),
            max_pages,
            cancelled: AtomicBool::new(false),
            work_changed: Notify::new(),
            shutdown: Notify::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits `url` if it has never been seen and the cap leaves room
    ///
    /// Returns whether the URL was pushed. URLs are compared by exact string
    /// identity. Nothing is admitted after cancellation.
    pub fn try_enqueue(&self, url: &str) -> bool {
        if self.is_cancelled() {
            return false;
        }

        let admitted = {
            let mut state = self.lock();
            admit(&mut state, self.max_pages, url)
        };

        if admitted {
            self.work_changed.notify_waiters();
        }
        admitted
    }

    /// Applies `try_enqueue` to every link under one lock acquisition
    ///
    /// Returns how many links were admitted.
    pub fn try_enqueue_all<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.is_cancelled() {
            return 0;
        }

        let admitted = {
            let mut state = self.lock();
            urls.into_iter()
                .filter(|url| admit(&mut state, self.max_pages, url.as_ref()))
                .count()
        };

        if admitted > 0 {
            self.work_changed.notify_waiters();
        }
        admitted
    }

    /// Removes the head of the queue and marks the caller active
    ///
    /// When the queue is empty this decides between "wait" and "finished":
    /// the crawl is finished when no worker is active, or when the visited
    /// set has reached the cap (nobody can admit anything new).
    pub fn try_dequeue(self: &Arc<Self>) -> Dequeue {
        if self.is_cancelled() {
            return Dequeue::Finished(FinishReason::Cancelled);
        }

        let finished = {
            let mut state = self.lock();
            if let Some(url) = state.queue.pop_front() {
                state.active += 1;
                return Dequeue::Claimed(ClaimedUrl {
                    url,
                    _guard: ActiveGuard {
                        frontier: Arc::clone(self),
                    },
                });
            }

            if state.active == 0 {
                FinishReason::Exhausted
            } else if state.visited.len() >= self.max_pages {
                FinishReason::CapReached
            } else {
                return Dequeue::Empty;
            }
        };

        // Let parked peers observe the same verdict without waiting out their timeout
        self.work_changed.notify_waiters();
        Dequeue::Finished(finished)
    }

    /// Future resolved on the next enqueue, idle transition, or cancel
    ///
    /// Call `enable()` on the pinned future before `try_dequeue` so a
    /// notification sent in between is kept.
    pub fn work_changed(&self) -> Notified<'_> {
        self.work_changed.notified()
    }

    fn release(&self) {
        let now_idle = {
            let mut state = self.lock();
            debug_assert!(state.active > 0, "active count released below zero");
            state.active = state.active.saturating_sub(1);
            state.active == 0
        };

        if now_idle {
            self.work_changed.notify_waiters();
        }
    }

    /// Requests cooperative shutdown of every worker
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::info!("Crawl cancellation requested");
        }
        self.shutdown.notify_waiters();
        self.work_changed.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        loop {
            let notified = self.shutdown.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn snapshot(&self) -> FrontierSnapshot {
        let state = self.lock();
        FrontierSnapshot {
            queued: state.queue.len(),
            visited: state.visited.len(),
            active: state.active,
        }
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn active_workers(&self) -> usize {
        self.lock().active
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.lock().visited.contains(url)
    }

    /// Every URL ever admitted, in no particular order
    pub fn visited_urls(&self) -> Vec<String> {
        self.lock().visited.iter().cloned().collect()
    }
}

fn admit(state: &mut FrontierState, max_pages: usize, url: &str) -> bool {
    if state.visited.len() >= max_pages || state.visited.contains(url) {
        return false;
    }
    state.visited.insert(url.to_string());
    state.queue.push_back(url.to_string());
    true
}

/// Decrements the active count exactly once when dropped
///
/// Dropping happens on every exit path: normal completion, early return,
/// panic unwinding, and cancellation of the future that owns the claim.
#[derive(Debug)]
struct ActiveGuard {
    frontier: Arc<Frontier>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.frontier.release();
    }
}

/// A URL taken off the frontier by one worker
#[derive(Debug)]
pub struct ClaimedUrl {
    url: String,
    _guard: ActiveGuard,
}

impl ClaimedUrl {
    pub fn url(&self) -> &str {
        &self.url
    }
}
