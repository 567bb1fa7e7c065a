//! Collaborator gates consulted by the orchestrator.
//!
//! [`ProcessingGate`] decides whether another source may be processed and
//! is told about every completed one. [`ReviewGate`] blocks after segments
//! are produced so the user can delete unwanted ones by hand.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;

use crate::context::{ResumeLatch, RunContext};
use crate::error::CoreResult;

pub trait ProcessingGate: Send + Sync {
    /// Called before each source. Returning false stops the batch.
    fn can_process(&self, path: &Path) -> bool;
    /// Called after a source finished successfully, before it is moved.
    fn register_processed(&self, path: &Path);
}

/// Gate that never refuses.
pub struct AllowAll;

impl ProcessingGate for AllowAll {
    fn can_process(&self, _path: &Path) -> bool {
        true
    }

    fn register_processed(&self, _path: &Path) {}
}

/// Allows at most `max` successfully processed sources per run.
pub struct InputLimit {
    max: usize,
    processed: AtomicUsize,
}

impl InputLimit {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            processed: AtomicUsize::new(0),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }
}

impl ProcessingGate for InputLimit {
    fn can_process(&self, _path: &Path) -> bool {
        self.processed() < self.max
    }

    fn register_processed(&self, path: &Path) {
        let count = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Registered {} ({}/{})", path.display(), count, self.max);
    }
}

pub trait ReviewGate: Send + Sync {
    /// Blocks until the user is done reviewing `folder`.
    ///
    /// Must return `Err(Cancelled)` if the run is cancelled while waiting.
    fn wait_for_review(&self, folder: &Path, ctx: &RunContext) -> CoreResult<()>;
}

/// Continues immediately.
pub struct SkipReview;

impl ReviewGate for SkipReview {
    fn wait_for_review(&self, _folder: &Path, ctx: &RunContext) -> CoreResult<()> {
        ctx.checkpoint()
    }
}

/// Waits on a [`ResumeLatch`] released by the controlling side.
pub struct LatchReview {
    latch: ResumeLatch,
}

impl LatchReview {
    pub fn new(latch: ResumeLatch) -> Self {
        Self { latch }
    }
}

impl ReviewGate for LatchReview {
    fn wait_for_review(&self, folder: &Path, ctx: &RunContext) -> CoreResult<()> {
        info!("Waiting for manual review of {}", folder.display());
        self.latch.arm();
        self.latch.wait(ctx)
    }
}
