//! Editor state: the three text buffers, diff annotations, and pass scheduling.
//!
//! Buffers:
//! - `current`: the live, user-edited text.
//! - `base`: the read-only pane showing the reconciled text (base lines plus
//!   inserted / removed lines, tagged through `annotations`).
//! - `original`: the baseline captured on load / "Make Original". Every pass
//!   reconciles `original` against `current`, so removed lines shown in `base`
//!   never feed back into the next pass.
//!
//! Ownership: a single task (the interactive loop) owns `EditorState`.
//! Background passes only ever see a [`PassRequest`] (immutable snapshots) and
//! hand back a `ReconciliationResult`, which [`EditorState::apply_result`]
//! installs into `base` and `annotations` together.
//!
//! Generations: `reset_document` bumps `generation`. A pass carries the
//! generation it was started in; results from an older generation are
//! discarded so text from a discarded document never reappears.

use core_reconcile::ReconciliationResult;
use core_text::{Buffer, BufferSnapshot, LineEnding};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub mod annotations;
pub mod notifier;

pub use annotations::{DiffAnnotations, DiffStyle, Rgb};
pub use notifier::{ChangeNotifier, NotifyDecision, ReconcileTaskState};

/// Immutable inputs for one background pass, captured on the owning thread.
#[derive(Debug, Clone)]
pub struct PassRequest {
    pub generation: u64,
    pub base: BufferSnapshot,
    pub current: BufferSnapshot,
}

/// Outcome of offering a pass result to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Result belongs to a superseded generation and was dropped.
    Stale,
}

/// Short-lived status text (e.g. "Open failed").
#[derive(Debug, Clone)]
pub struct EphemeralMessage {
    pub text: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct EditorState {
    pub current: Buffer,
    pub base: Buffer,
    pub original: Buffer,
    pub annotations: DiffAnnotations,
    pub notifier: ChangeNotifier,
    pub file_name: Option<PathBuf>,
    pub original_line_ending: LineEnding,
    pub had_trailing_newline: bool,
    /// Current text differs from what is on disk.
    pub dirty: bool,
    /// Last advisory progress value of the in-flight pass.
    pub progress: Option<u8>,
    pub ephemeral_status: Option<EphemeralMessage>,
    generation: u64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl EditorState {
    /// Empty document; `debounce` configures the change notifier.
    pub fn new(debounce: Duration) -> Self {
        Self {
            current: Buffer::empty("current"),
            base: Buffer::empty("base"),
            original: Buffer::empty("original"),
            annotations: DiffAnnotations::default(),
            notifier: ChangeNotifier::new(debounce),
            file_name: None,
            original_line_ending: LineEnding::Lf,
            had_trailing_newline: false,
            dirty: false,
            progress: None,
            ephemeral_status: None,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reset all three buffers to `text` as a fresh baseline and clear annotations.
    ///
    /// Pending reruns are dropped; a pass already in flight will be discarded
    /// as stale when it reports back.
    pub fn reset_document(&mut self, text: &str) {
        self.current.set_text(text);
        self.base.set_text(text);
        self.original.set_text(text);
        self.annotations.clear();
        self.notifier.reset();
        self.progress = None;
        self.generation += 1;
        debug!(
            target: "state",
            generation = self.generation,
            lines = self.original.line_count(),
            "baseline_reset"
        );
    }

    /// Replace the current (edited) text. Returns false when nothing changed.
    pub fn replace_current(&mut self, text: &str) -> bool {
        if self.current.text() == text {
            return false;
        }
        self.current.set_text(text);
        self.dirty = true;
        true
    }

    /// Snapshot `original` and `current` for a pass. Must be called right when
    /// the notifier decides a pass starts.
    pub fn pass_request(&self) -> PassRequest {
        PassRequest {
            generation: self.generation,
            base: self.original.snapshot(),
            current: self.current.snapshot(),
        }
    }

    /// Install a completed pass into `base` and `annotations`.
    pub fn apply_result(&mut self, generation: u64, result: &ReconciliationResult) -> ApplyOutcome {
        if generation != self.generation {
            trace!(target: "state", generation, current = self.generation, "stale_result_dropped");
            return ApplyOutcome::Stale;
        }
        self.progress = None;
        self.base.set_text(&result.text());
        self.annotations.replace(result);
        ApplyOutcome::Applied
    }

    /// Record an advisory progress value if it belongs to the live generation.
    pub fn record_progress(&mut self, generation: u64, percent: u8) -> bool {
        if generation != self.generation {
            return false;
        }
        self.progress = Some(percent.min(100));
        true
    }

    pub fn set_ephemeral<S: Into<String>>(&mut self, msg: S, ttl: Duration) {
        self.ephemeral_status = Some(EphemeralMessage {
            text: msg.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    /// Tick ephemeral status; returns true if message expired and was cleared.
    pub fn tick_ephemeral(&mut self, now: Instant) -> bool {
        if let Some(m) = &self.ephemeral_status
            && now >= m.expires_at
        {
            self.ephemeral_status = None;
            return true;
        }
        false
    }
}
