// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-document reconciliation: gate → classify → diff → schedule.
//!
//! One [`SemanticHighlighter`] is created for each open editor. A pass holds
//! the document's [`SyncGate`] permit from classification until the apply task
//! has been handed to the UI thread, so the previously applied positions are
//! only ever read and replaced by one pass at a time.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::editor::apply_scheduler::{ApplyOutcome, ApplyScheduler, PresentationDelta, panic_message};
use crate::semantic::classifier::ReferenceClassifier;
use crate::semantic::diff::{DiffEngine, StyledPosition};
use crate::semantic::error::{HighlightError, Result};
use crate::semantic::gate::{CancellationToken, SyncGate};
use crate::semantic::provider::ResolvedReferenceProvider;
use crate::semantic::style::StyleRegistry;

/// Phases a single pass moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassState {
    Idle,
    Acquiring,
    TimedOut,
    Classifying,
    Canceled,
    Diffing,
    Scheduling,
    Releasing,
}

impl PassState {
    /// Returns true if a pass may move from `self` to `next`.
    ///
    /// `Classifying` and `Diffing` may go straight to `Releasing` when the
    /// pass fails.
    pub fn can_advance_to(self, next: PassState) -> bool {
        use PassState::*;

        matches!(
            (self, next),
            (Idle, Acquiring)
                | (Acquiring, TimedOut | Classifying)
                | (TimedOut, Idle)
                | (Classifying, Canceled | Diffing | Releasing)
                | (Diffing, Canceled | Scheduling | Releasing)
                | (Scheduling, Releasing)
                | (Canceled, Releasing)
                | (Releasing, Idle)
        )
    }
}

/// The cancellation checkpoint at which a pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    BeforeClassification,
    AfterClassification,
    AfterDiff,
    AfterPresentation,
}

/// Counts from one completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Positions in the freshly classified set
    pub records: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub apply: ApplyOutcome,
}

/// How a call to [`SemanticHighlighter::reconcile`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass ran to completion and its result was committed
    Completed(PassSummary),
    /// The cancellation flag was seen at a checkpoint
    Canceled(Checkpoint),
    /// The permit was not acquired in time; nothing was classified
    TimedOut,
    /// The pass was aborted; nothing was committed or applied
    Failed(HighlightError),
}

/// Performance metrics for reconciliation passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileMetrics {
    /// Passes that ran to completion
    pub passes_completed: usize,
    /// Passes stopped at a cancellation checkpoint
    pub passes_canceled: usize,
    /// Passes skipped because the permit was busy
    pub passes_timed_out: usize,
    /// Passes aborted by a provider error or a panic
    pub passes_failed: usize,
    /// Positions classified by completed passes
    pub records_classified: usize,
    /// Positions painted by completed passes
    pub positions_added: usize,
    /// Positions cleared by completed passes
    pub positions_removed: usize,
    /// Total time spent in completed passes
    pub total_time: Duration,
    /// Average time per completed pass
    pub avg_pass_time: Duration,
    /// Longest completed pass
    pub max_pass_time: Duration,
}

impl ReconcileMetrics {
    /// Updates metrics with a completed pass.
    pub fn record_completed(&mut self, duration: Duration, summary: &PassSummary) {
        self.passes_completed += 1;
        self.records_classified += summary.records;
        self.positions_added += summary.added;
        self.positions_removed += summary.removed;
        self.total_time += duration;
        self.avg_pass_time = self.total_time / self.passes_completed as u32;
        self.max_pass_time = self.max_pass_time.max(duration);
    }

    pub fn record_canceled(&mut self) {
        self.passes_canceled += 1;
    }

    pub fn record_timed_out(&mut self) {
        self.passes_timed_out += 1;
    }

    pub fn record_failed(&mut self) {
        self.passes_failed += 1;
    }

    /// Returns the number of passes that were attempted.
    pub fn passes_attempted(&self) -> usize {
        self.passes_completed + self.passes_canceled + self.passes_timed_out + self.passes_failed
    }

    /// Resets all metrics to zero.
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    /// Generates a performance report.
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Semantic Highlighting Report ===\n\n");
        report.push_str("Passes:\n");
        report.push_str(&format!("  Completed: {}\n", self.passes_completed));
        report.push_str(&format!("  Canceled: {}\n", self.passes_canceled));
        report.push_str(&format!("  Timed out: {}\n", self.passes_timed_out));
        report.push_str(&format!("  Failed: {}\n", self.passes_failed));

        report.push_str("\nPositions:\n");
        report.push_str(&format!("  Classified: {}\n", self.records_classified));
        report.push_str(&format!("  Added: {}\n", self.positions_added));
        report.push_str(&format!("  Removed: {}\n", self.positions_removed));

        report.push_str("\nTiming:\n");
        report.push_str(&format!("  Total: {}ms\n", self.total_time.as_millis()));
        report.push_str(&format!("  Average pass: {}us\n", self.avg_pass_time.as_micros()));
        report.push_str(&format!("  Slowest pass: {}us\n", self.max_pass_time.as_micros()));

        report.push_str("\n=== End Report ===\n");
        report
    }

    /// Checks that no pass failed and the average pass stayed within `budget`.
    pub fn meets_requirements(&self, budget: Duration) -> (bool, Vec<String>) {
        let mut issues = Vec::new();

        if self.passes_failed > 0 {
            issues.push(format!("{} passes failed", self.passes_failed));
        }
        if self.avg_pass_time > budget {
            issues.push(format!(
                "Average pass exceeds {}ms budget: {}ms",
                budget.as_millis(),
                self.avg_pass_time.as_millis()
            ));
        }

        (issues.is_empty(), issues)
    }
}

static NEXT_PASS_ID: AtomicU64 = AtomicU64::new(1);

/// Tracks one pass through the [`PassState`] machine.
#[derive(Debug)]
struct PassTracker {
    id: u64,
    state: PassState,
}

impl PassTracker {
    fn start() -> Self {
        let mut tracker = Self {
            id: NEXT_PASS_ID.fetch_add(1, Ordering::Relaxed),
            state: PassState::Idle,
        };
        tracker.advance(PassState::Acquiring);
        tracker
    }

    fn advance(&mut self, next: PassState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid pass transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(pass = self.id, from = ?self.state, to = ?next, "pass state");
        self.state = next;
    }
}

/// Semantic highlighting for one open document.
#[derive(Debug)]
pub struct SemanticHighlighter {
    registry: Arc<StyleRegistry>,
    gate: SyncGate,
    diff: Mutex<DiffEngine>,
    scheduler: ApplyScheduler,
    metrics: Mutex<ReconcileMetrics>,
}

impl SemanticHighlighter {
    pub fn new(registry: Arc<StyleRegistry>, scheduler: ApplyScheduler) -> Self {
        Self {
            registry,
            gate: SyncGate::new(),
            diff: Mutex::new(DiffEngine::new()),
            scheduler,
            metrics: Mutex::new(ReconcileMetrics::default()),
        }
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// Runs one reconciliation pass against `provider`.
    ///
    /// Never panics and never returns an error: timeouts, cancellation and
    /// failures are reported through the returned [`PassOutcome`], and the
    /// permit is released on every path.
    pub fn reconcile(&self, provider: &dyn ResolvedReferenceProvider, cancel: &CancellationToken) -> PassOutcome {
        let started = Instant::now();
        let mut pass = PassTracker::start();

        let permit = match self.gate.acquire(self.registry.gate_timeout()) {
            Ok(permit) => permit,
            Err(err) => {
                tracing::warn!(pass = pass.id, %err, "skipping semantic highlighting pass");
                pass.advance(PassState::TimedOut);
                self.metrics().record_timed_out();
                pass.advance(PassState::Idle);
                return PassOutcome::TimedOut;
            }
        };
        pass.advance(PassState::Classifying);

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_pass(provider, cancel, &mut pass)))
            .unwrap_or_else(|payload| Err(HighlightError::Panicked(panic_message(payload.as_ref()))));

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(pass = pass.id, %err, "semantic highlighting pass failed");
                PassOutcome::Failed(err)
            }
        };

        pass.advance(PassState::Releasing);
        drop(permit);

        let elapsed = started.elapsed();
        let mut metrics = self.metrics();
        match &outcome {
            PassOutcome::Completed(summary) => metrics.record_completed(elapsed, summary),
            PassOutcome::Canceled(_) => metrics.record_canceled(),
            PassOutcome::TimedOut => metrics.record_timed_out(),
            PassOutcome::Failed(_) => metrics.record_failed(),
        }
        drop(metrics);

        pass.advance(PassState::Idle);
        tracing::debug!(pass = pass.id, ?outcome, ?elapsed, "semantic highlighting pass finished");
        outcome
    }

    /// Body of a pass; runs with the permit held.
    fn run_pass(
        &self,
        provider: &dyn ResolvedReferenceProvider,
        cancel: &CancellationToken,
        pass: &mut PassTracker,
    ) -> Result<PassOutcome> {
        if cancel.is_canceled() {
            pass.advance(PassState::Canceled);
            return Ok(PassOutcome::Canceled(Checkpoint::BeforeClassification));
        }

        let mut classifier = ReferenceClassifier::new(provider.source());
        provider.visit(&mut classifier)?;
        let visited = classifier.nodes_visited();
        let positions = classifier.into_positions();
        tracing::debug!(pass = pass.id, visited, records = positions.len(), "classified");

        if cancel.is_canceled() {
            pass.advance(PassState::Canceled);
            return Ok(PassOutcome::Canceled(Checkpoint::AfterClassification));
        }
        pass.advance(PassState::Diffing);

        let mut diff = self.diff_engine();
        let delta = diff.diff(&positions, &self.registry);
        if cancel.is_canceled() {
            pass.advance(PassState::Canceled);
            return Ok(PassOutcome::Canceled(Checkpoint::AfterDiff));
        }

        let presentation = PresentationDelta::from_delta(&delta);
        if cancel.is_canceled() {
            pass.advance(PassState::Canceled);
            return Ok(PassOutcome::Canceled(Checkpoint::AfterPresentation));
        }
        pass.advance(PassState::Scheduling);

        // Commit only once scheduling has returned; a panic there fails the
        // pass with the previous applied list intact.
        let apply = self.scheduler.schedule(presentation);
        diff.commit(&delta);
        drop(diff);

        Ok(PassOutcome::Completed(PassSummary {
            records: positions.len(),
            added: delta.added.len(),
            removed: delta.removed.len(),
            unchanged: delta.unchanged.len(),
            apply,
        }))
    }

    /// Snapshot of the positions currently applied to the editor.
    pub fn applied(&self) -> Vec<StyledPosition> {
        self.diff_engine().applied().to_vec()
    }

    /// Forgets the applied positions, so the next pass repaints everything.
    pub fn reset(&self) {
        self.diff_engine().clear();
    }

    /// Returns true if a pass currently holds the permit.
    pub fn is_busy(&self) -> bool {
        !self.gate.is_free()
    }

    /// Returns a copy of the metrics collected so far.
    pub fn metrics_snapshot(&self) -> ReconcileMetrics {
        self.metrics().clone()
    }

    pub fn reset_metrics(&self) {
        self.metrics().reset();
    }

    fn diff_engine(&self) -> MutexGuard<'_, DiffEngine> {
        self.diff.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn metrics(&self) -> MutexGuard<'_, ReconcileMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_state_transitions() {
        use PassState::*;

        let completed = [Idle, Acquiring, Classifying, Diffing, Scheduling, Releasing, Idle];
        let canceled = [Idle, Acquiring, Classifying, Canceled, Releasing, Idle];
        let timed_out = [Idle, Acquiring, TimedOut, Idle];
        for path in [&completed[..], &canceled[..], &timed_out[..]] {
            assert!(path.windows(2).all(|step| step[0].can_advance_to(step[1])), "{path:?}");
        }

        assert!(!Idle.can_advance_to(Classifying));
        assert!(!TimedOut.can_advance_to(Releasing));
        assert!(!Scheduling.can_advance_to(Canceled));
        assert!(!Releasing.can_advance_to(Acquiring));
    }

    #[test]
    fn test_reconcile_metrics() {
        let mut metrics = ReconcileMetrics::default();
        let summary = PassSummary {
            records: 10,
            added: 4,
            removed: 1,
            unchanged: 6,
            apply: ApplyOutcome::Posted,
        };

        metrics.record_completed(Duration::from_millis(10), &summary);
        metrics.record_completed(Duration::from_millis(30), &summary);
        metrics.record_canceled();
        metrics.record_timed_out();

        assert_eq!(metrics.passes_completed, 2);
        assert_eq!(metrics.records_classified, 20);
        assert_eq!(metrics.positions_added, 8);
        assert_eq!(metrics.avg_pass_time, Duration::from_millis(20));
        assert_eq!(metrics.max_pass_time, Duration::from_millis(30));
        assert_eq!(metrics.passes_attempted(), 4);

        let report = metrics.generate_report();
        assert!(report.contains("Completed: 2"));
        assert!(report.contains("Slowest pass: 30000us"));
        assert_eq!(metrics.meets_requirements(Duration::from_millis(25)), (true, Vec::new()));
        let (ok, issues) = metrics.meets_requirements(Duration::from_millis(5));
        assert!(!ok);
        assert_eq!(issues.len(), 1);

        metrics.reset();
        assert_eq!(metrics, ReconcileMetrics::default());
    }
}
