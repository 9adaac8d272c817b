//! Change notifier: single-flight scheduling of reconciliation passes.
//!
//! Contract:
//! - At most one pass is in flight at any time.
//! - A change that arrives while a pass runs is remembered as a single pending
//!   rerun; further changes coalesce into it (no backlog grows).
//! - When the in-flight pass completes with a rerun pending, exactly one new
//!   pass is due. The caller snapshots the buffers at that moment, so the rerun
//!   sees every coalesced edit.
//! - Optional debounce: while idle, a change arms a deadline and the pass only
//!   starts once `poll` observes the deadline has elapsed. Each further change
//!   pushes the deadline out.
//!
//! The notifier never spawns anything itself; it returns decisions and the
//! interactive loop acts on them.

use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileTaskState {
    #[default]
    Idle,
    /// A pass is in flight.
    Running,
    /// A pass is in flight and the buffer changed since it was started.
    PendingRerun,
}

/// What the caller must do after reporting a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyDecision {
    /// Snapshot the buffers and start a pass now.
    Start,
    /// Debounce armed; wait for `poll`.
    Deferred,
    /// A pass is in flight; a rerun has been recorded.
    Coalesced,
}

#[derive(Debug, Default)]
pub struct ChangeNotifier {
    state: ReconcileTaskState,
    debounce: Duration,
    deadline: Option<Instant>,
    started: u64,
    coalesced: u64,
}

impl ChangeNotifier {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            ..Self::default()
        }
    }

    pub fn state(&self) -> ReconcileTaskState {
        self.state
    }

    pub fn in_flight(&self) -> bool {
        !matches!(self.state, ReconcileTaskState::Idle)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Passes started since creation.
    pub fn started(&self) -> u64 {
        self.started
    }

    /// Changes absorbed into a pending rerun since creation.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Report that the current buffer changed.
    pub fn on_change(&mut self, now: Instant) -> NotifyDecision {
        match self.state {
            ReconcileTaskState::Running | ReconcileTaskState::PendingRerun => {
                self.state = ReconcileTaskState::PendingRerun;
                self.coalesced += 1;
                trace!(target: "notifier", "change_coalesced");
                NotifyDecision::Coalesced
            }
            ReconcileTaskState::Idle if self.debounce.is_zero() => {
                self.begin();
                NotifyDecision::Start
            }
            ReconcileTaskState::Idle => {
                self.deadline = Some(now + self.debounce);
                NotifyDecision::Deferred
            }
        }
    }

    /// Drive the debounce timer. Returns true when a pass should start now.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state != ReconcileTaskState::Idle {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.begin();
                true
            }
            _ => false,
        }
    }

    /// Report that the in-flight pass finished (successfully, failed, or
    /// stale). Returns true when a rerun should start now.
    pub fn complete(&mut self, now: Instant) -> bool {
        match self.state {
            ReconcileTaskState::Running => {
                self.state = ReconcileTaskState::Idle;
                false
            }
            ReconcileTaskState::PendingRerun if self.debounce.is_zero() => {
                debug!(target: "notifier", "rerun_after_complete");
                self.begin();
                true
            }
            ReconcileTaskState::PendingRerun => {
                self.state = ReconcileTaskState::Idle;
                self.deadline = Some(now + self.debounce);
                false
            }
            ReconcileTaskState::Idle => {
                warn!(target: "notifier", "complete_without_pass");
                false
            }
        }
    }

    /// Drop any pending rerun or armed debounce. An in-flight pass stays
    /// accounted for so that a new pass cannot start before it completes.
    pub fn reset(&mut self) {
        self.deadline = None;
        if self.state == ReconcileTaskState::PendingRerun {
            self.state = ReconcileTaskState::Running;
        }
    }

    fn begin(&mut self) {
        self.state = ReconcileTaskState::Running;
        self.deadline = None;
        self.started += 1;
    }
}
