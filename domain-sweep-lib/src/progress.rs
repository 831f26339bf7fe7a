//! Progress reporting hooks.
//!
//! The orchestrator and the batch checker call these hooks at fixed points;
//! every method has an empty default so a reporter only implements what it
//! displays. [`NoProgress`] is used when nothing should be shown.

use crate::types::{BaseOutcome, RunSummary};

/// Receives progress events from a sweep.
pub trait ProgressReporter: Send + Sync {
    /// Called once after the resume scan.
    fn on_run_start(&self, _total_bases: usize, _pending_bases: usize) {}

    /// Called before the first request of a base is sent.
    ///
    /// `index` is 1-based over all bases, including already complete ones.
    fn on_base_start(&self, _base: &str, _index: usize, _total: usize, _domains: usize, _batches: usize) {}

    /// Called after each batch's receive loop ends.
    fn on_batch_done(&self, _base: &str, _batch: usize, _batches: usize, _answered: usize, _expected: usize) {}

    /// Called once per base with its final outcome.
    fn on_base_finished(&self, _base: &str, _outcome: &BaseOutcome) {}

    /// Called after the export pass.
    fn on_run_finished(&self, _summary: &RunSummary) {}
}

/// Reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}
