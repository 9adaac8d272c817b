//! Document commands applied on the interactive loop.
//!
//! Each command that replaces the baseline goes through
//! `EditorState::reset_document`, so annotations are cleared, pending reruns
//! are dropped and any in-flight pass becomes stale in one step.

use crate::io_ops::{OpenFileResult, OpenSuccess, WriteFileResult, open_file, write_file};
use core_events::CommandEvent;
use core_state::EditorState;
use core_text::LineEnding;
use std::time::Duration;

const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchResult {
    pub dirty: bool,
    pub quit: bool,
    /// The baseline was replaced; no pass is needed until the next edit.
    pub baseline_reset: bool,
}

impl DispatchResult {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }
    pub fn quit() -> Self {
        Self {
            dirty: true,
            quit: true,
            baseline_reset: false,
        }
    }
    pub fn baseline_reset() -> Self {
        Self {
            dirty: true,
            quit: false,
            baseline_reset: true,
        }
    }
}

/// Clear current, base and original text.
pub fn new_document(state: &mut EditorState) {
    state.reset_document("");
    state.file_name = None;
    state.original_line_ending = LineEnding::default();
    state.had_trailing_newline = false;
    state.dirty = false;
    tracing::info!(target: "runtime.command", generation = state.generation(), "new_document");
}

/// Adopt the live current text as the new baseline.
pub fn make_original(state: &mut EditorState) {
    let text = state.current.text();
    state.reset_document(&text);
    tracing::info!(
        target: "runtime.command",
        generation = state.generation(),
        lines = state.original.line_count(),
        "make_original"
    );
}

/// Install a successfully loaded file as a fresh baseline.
pub fn apply_open(state: &mut EditorState, loaded: OpenSuccess) {
    if loaded.mixed_line_endings {
        tracing::warn!(target: "io", file = %loaded.file_name.display(), "mixed_line_endings_detected");
    }
    state.reset_document(&loaded.text);
    state.file_name = Some(loaded.file_name);
    state.original_line_ending = loaded.original_line_ending;
    state.had_trailing_newline = loaded.had_trailing_newline;
    state.dirty = false;
}

fn handle_open(path: std::path::PathBuf, state: &mut EditorState) -> DispatchResult {
    match open_file(&path) {
        OpenFileResult::Success(loaded) => {
            apply_open(state, loaded);
            state.set_ephemeral("Opened", STATUS_TTL);
            DispatchResult::baseline_reset()
        }
        OpenFileResult::Error => {
            state.set_ephemeral("Open failed", STATUS_TTL);
            DispatchResult::dirty()
        }
    }
}

fn handle_save(target: Option<std::path::PathBuf>, state: &mut EditorState) -> DispatchResult {
    match write_file(state, target.as_deref()) {
        WriteFileResult::Success => state.set_ephemeral("Wrote", STATUS_TTL),
        WriteFileResult::NoFilename => {
            tracing::error!(target: "runtime.command", "write_no_filename");
            state.set_ephemeral("No filename", STATUS_TTL);
        }
        WriteFileResult::Error => state.set_ephemeral("Write failed", STATUS_TTL),
    }
    DispatchResult::dirty()
}

pub fn dispatch(cmd: CommandEvent, state: &mut EditorState) -> DispatchResult {
    match cmd {
        CommandEvent::New => {
            new_document(state);
            DispatchResult::baseline_reset()
        }
        CommandEvent::MakeOriginal => {
            make_original(state);
            DispatchResult::baseline_reset()
        }
        CommandEvent::Open(path) => handle_open(path, state),
        CommandEvent::Save(target) => handle_save(target, state),
        CommandEvent::Quit => DispatchResult::quit(),
    }
}
