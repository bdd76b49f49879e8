//! Worker state definitions for the crawl loop
//!
//! Every worker cycles `Idle -> Acquiring -> Active -> Idle` until the
//! frontier reports the crawl finished, at which point it moves to
//! `Terminated` and exits.

use crate::CrawlerError;
use std::fmt;

/// Represents the current state of one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Holding no URL
    Idle,

    /// Trying to claim a URL from the frontier
    Acquiring,

    /// Processing a claimed URL (robots check, fetch, parse, enqueue)
    Active,

    /// The worker has left its loop and will not claim further work
    Terminated,
}

impl WorkerState {
    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// - `Acquiring -> Idle` is the "frontier momentarily empty, wait and retry" path.
    /// - `Idle -> Terminated` and `Active -> Terminated` are cancellation paths.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Idle, Acquiring)
                | (Idle, Terminated)
                | (Acquiring, Active)
                | (Acquiring, Idle)
                | (Acquiring, Terminated)
                | (Active, Idle)
                | (Active, Terminated)
        )
    }

    /// Returns the next state, or an error if the transition is not allowed
    pub fn transition(self, next: WorkerState) -> Result<WorkerState, CrawlerError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CrawlerError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Active => "active",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
