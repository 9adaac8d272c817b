//! Incremental line reconciliation.
//!
//! Given the baseline ("base") lines and the edited ("current") lines, a pass
//! produces a new base sequence that keeps every base line and every current
//! line exactly once, in their original relative order, and tags which output
//! lines were introduced by the edit (`added`) or dropped by it (`removed`).
//!
//! Algorithm (greedy forward alignment with lookahead rescue):
//! 1. Walk both sequences with cursors `i` (base) and `j` (current).
//! 2. Equal lines are emitted once and both cursors advance.
//! 3. On mismatch, in order:
//!    - insertion: `base[i]` occurs later in `current` -> the current lines up to
//!      that occurrence are emitted as added;
//!    - deletion: `current[j]` occurs later in `base` -> the base lines up to that
//!      occurrence are emitted as removed (kept in the output, tagged);
//!    - replacement: neither lookahead hits -> `current[j]` is emitted added and
//!      `base[i]` removed, both cursors advance.
//! 4. When one side is exhausted the remainder of the other side is emitted as a
//!    final insertion (current) or removal (base) run.
//!
//! Bounds:
//! - Every emitted line bumps the session's safety counter; exceeding
//!   `N + M + safety_margin` aborts the pass with
//!   [`ReconcileError::SafetyLimitExceeded`]. [`Reconciler::run_or_base`] turns
//!   that abort into the unchanged base.
//! - Lookahead scans are index based and optionally capped by
//!   `ReconcileOptions::lookahead_window`.
//! - All lookahead comparisons of a pass share one budget of
//!   `limit * lookahead_per_line`. Once it is spent, every remaining mismatch
//!   takes the replacement step, so a pass costs `O(limit)` comparisons
//!   instead of `O(N * M)`.
//! - A base of at most one line is treated as "no baseline yet" and returned
//!   unchanged without running the alignment.
//!
//! The engine is pure: it reads two [`BufferSnapshot`]s and returns an owned
//! [`ReconciliationResult`]. It never touches live buffers, which is what lets
//! the caller run it on a worker thread.

use core_text::BufferSnapshot;
use tracing::{debug, warn};

pub mod progress;
pub mod result;
pub mod session;

pub use progress::{NoProgress, ProgressSink};
pub use result::{LineTag, PassStats, ReconciliationResult};
pub use session::ReconciliationSession;

/// Lines allowed beyond `N + M` before a pass is considered runaway.
pub const DEFAULT_SAFETY_MARGIN: usize = 10;

/// Lookahead comparisons allowed per unit of emit limit.
pub const DEFAULT_LOOKAHEAD_PER_LINE: usize = 64;

/// The single failure mode of a pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("reconciliation safety limit exceeded: emitted {emitted} lines, limit {limit}")]
    SafetyLimitExceeded { limit: usize, emitted: usize },
}

/// Tunables for a [`Reconciler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Added to `N + M` to form the per-pass emit limit.
    pub safety_margin: usize,
    /// Maximum number of lines a single rescue lookahead inspects. `None` scans
    /// to the end of the sequence.
    pub lookahead_window: Option<usize>,
    /// Absolute ceiling on emitted lines, applied on top of the size-derived limit.
    pub max_emitted: Option<usize>,
    /// Scales the emit limit into the per-pass lookahead comparison budget.
    pub lookahead_per_line: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
            lookahead_window: None,
            max_emitted: None,
            lookahead_per_line: DEFAULT_LOOKAHEAD_PER_LINE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Emit limit for inputs of `base_len` and `current_len` lines.
    pub fn safety_limit(&self, base_len: usize, current_len: usize) -> usize {
        let derived = base_len
            .saturating_add(current_len)
            .saturating_add(self.options.safety_margin);
        match self.options.max_emitted {
            Some(cap) => derived.min(cap),
            None => derived,
        }
    }

    /// Lookahead comparisons a pass with emit limit `limit` may spend.
    pub fn lookahead_budget(&self, limit: usize) -> usize {
        limit.saturating_mul(self.options.lookahead_per_line)
    }

    /// Run one pass.
    pub fn run(
        &self,
        base: &BufferSnapshot,
        current: &BufferSnapshot,
        progress: &dyn ProgressSink,
    ) -> Result<ReconciliationResult, ReconcileError> {
        let span = tracing::debug_span!(
            target: "reconcile",
            "reconcile_pass",
            base_lines = base.len(),
            current_lines = current.len()
        );
        let _enter = span.enter();

        if base.len() <= 1 {
            debug!(target: "reconcile", base_lines = base.len(), "baseline_short_circuit");
            progress.report(100);
            return Ok(ReconciliationResult::unchanged(base));
        }

        let limit = self.safety_limit(base.len(), current.len());
        let session = ReconciliationSession::new(
            base.as_slice(),
            current.as_slice(),
            limit,
            self.options.lookahead_window,
            self.lookahead_budget(limit),
        );
        let result = session.run(progress)?;
        let stats = result.stats();
        debug!(
            target: "reconcile",
            matched = stats.matched,
            added = stats.added,
            removed = stats.removed,
            steps = stats.steps,
            probes = stats.probes,
            budget_exhausted = stats.budget_exhausted,
            "reconcile_complete"
        );
        Ok(result)
    }

    /// Run one pass, degrading to the unchanged base when the safety limit trips.
    pub fn run_or_base(
        &self,
        base: &BufferSnapshot,
        current: &BufferSnapshot,
        progress: &dyn ProgressSink,
    ) -> ReconciliationResult {
        match self.run(base, current, progress) {
            Ok(result) => result,
            Err(err) => {
                warn!(target: "reconcile", %err, "reconcile_overrun_keep_base");
                ReconciliationResult::unchanged(base)
            }
        }
    }
}
