//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `WorkerState`: the per-worker state machine (idle, acquiring, active, terminated)
//! - `UrlOutcome`: how the processing of one claimed URL ended

mod outcome;
mod worker_state;

// Re-export main types
pub use outcome::UrlOutcome;
pub use worker_state::WorkerState;
