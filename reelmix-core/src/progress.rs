//! Batch progress and remaining-time estimation.
//!
//! [`ProgressTracker`] is updated after every input file, whether it
//! succeeded or failed, and produces the observational [`ProgressSnapshot`]
//! handed to the reporter.

use std::time::{Duration, Instant};

use crate::utils::format_eta;

/// Point-in-time view of the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub total_inputs: usize,
    /// Files attempted so far, successful or not.
    pub processed_inputs: usize,
    pub failed_inputs: usize,
    /// Expected mixes; 0 for split-only until the final snapshot.
    pub total_outputs: usize,
    pub generated_outputs: usize,
    pub estimated_remaining: Option<Duration>,
}

/// End-of-batch totals.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total_inputs: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Files never attempted because the processing gate closed.
    pub skipped: usize,
    pub generated_outputs: usize,
    pub elapsed: Duration,
}

/// Average time per attempted file times the files left, floored at zero.
///
/// `None` until at least one file has been attempted.
pub fn estimate_remaining(elapsed: Duration, processed: usize, total: usize) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    let remaining = total.saturating_sub(processed);
    if remaining == 0 {
        return Some(Duration::ZERO);
    }
    let per_file = elapsed.as_secs_f64() / processed as f64;
    Some(Duration::from_secs_f64((per_file * remaining as f64).max(0.0)))
}

pub struct ProgressTracker {
    started: Instant,
    total_inputs: usize,
    outputs_per_input: usize,
    known_outputs: bool,
    processed: usize,
    failed: usize,
    generated: usize,
}

impl ProgressTracker {
    /// `known_outputs` is false for split-only, whose output count is only
    /// known once the batch is done.
    pub fn new(total_inputs: usize, outputs_per_input: usize, known_outputs: bool) -> Self {
        Self::started_at(Instant::now(), total_inputs, outputs_per_input, known_outputs)
    }

    pub fn started_at(
        started: Instant,
        total_inputs: usize,
        outputs_per_input: usize,
        known_outputs: bool,
    ) -> Self {
        Self {
            started,
            total_inputs,
            outputs_per_input,
            known_outputs,
            processed: 0,
            failed: 0,
            generated: 0,
        }
    }

    pub fn record_success(&mut self, outputs: usize) {
        self.processed += 1;
        self.generated += outputs;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    pub fn remaining_inputs(&self) -> usize {
        self.total_inputs.saturating_sub(self.processed)
    }

    fn total_outputs(&self) -> usize {
        if self.known_outputs {
            self.outputs_per_input * self.total_inputs
        } else {
            0
        }
    }

    pub fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let elapsed = now.saturating_duration_since(self.started);
        ProgressSnapshot {
            total_inputs: self.total_inputs,
            processed_inputs: self.processed,
            failed_inputs: self.failed,
            total_outputs: self.total_outputs(),
            generated_outputs: self.generated,
            estimated_remaining: estimate_remaining(elapsed, self.processed, self.total_inputs),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Last snapshot of the batch: the output total is settled and nothing remains.
    pub fn final_snapshot(&self) -> ProgressSnapshot {
        let mut snapshot = self.snapshot();
        if !self.known_outputs {
            snapshot.total_outputs = self.generated;
        }
        snapshot.estimated_remaining = Some(Duration::ZERO);
        snapshot
    }

    /// Log line announcing the estimate, when files remain.
    pub fn eta_line(&self, snapshot: &ProgressSnapshot) -> Option<String> {
        let remaining = self.remaining_inputs();
        if remaining == 0 {
            return None;
        }
        snapshot.estimated_remaining.map(|eta| {
            format!(
                "Estimated remaining time: ~{} for {} more video(s).",
                format_eta(eta),
                remaining
            )
        })
    }

    pub fn summary(&self, skipped: usize) -> BatchSummary {
        BatchSummary {
            total_inputs: self.total_inputs,
            succeeded: self.processed - self.failed,
            failed: self.failed,
            skipped,
            generated_outputs: self.generated,
            elapsed: self.started.elapsed(),
        }
    }
}
