//! File IO helpers.
//!
//! Synchronous and minimal. A failed read never produces partial state: the
//! caller only sees `OpenFileResult::Error` and leaves every buffer untouched.

use core_state::EditorState;
use core_text::{LineEnding, normalize_line_endings, restore_line_endings};
use std::path::{Path, PathBuf};

/// Result of attempting to open a file.
#[derive(Debug)]
pub enum OpenFileResult {
    Success(OpenSuccess),
    Error, // already logged
}

#[derive(Debug)]
pub struct OpenSuccess {
    /// LF-normalized document text without the final separator.
    pub text: String,
    pub file_name: PathBuf,
    pub original_line_ending: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed_line_endings: bool,
}

/// Read `path` as UTF-8 and normalize its line endings.
pub fn open_file(path: &Path) -> OpenFileResult {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let norm = normalize_line_endings(&content);
            tracing::info!(
                target: "io",
                file = %path.display(),
                size_bytes = content.len(),
                line_ending = ?norm.original,
                "file_opened"
            );
            OpenFileResult::Success(OpenSuccess {
                text: norm.body().to_string(),
                file_name: path.to_path_buf(),
                original_line_ending: norm.original,
                had_trailing_newline: norm.had_trailing_newline,
                mixed_line_endings: norm.mixed,
            })
        }
        Err(e) => {
            tracing::error!(target: "io", file = %path.display(), ?e, "file_open_error");
            OpenFileResult::Error
        }
    }
}

/// Result of a write attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteFileResult {
    Success,
    NoFilename,
    Error,
}

/// Write the current buffer to `target` (or the opened file) honoring the
/// original line ending style and trailing newline. A successful write to an
/// explicit target makes it the document's file name.
pub fn write_file(state: &mut EditorState, target: Option<&Path>) -> WriteFileResult {
    let path = match (target, state.file_name.as_ref()) {
        (Some(p), _) => p.to_path_buf(),
        (None, Some(existing)) => existing.clone(),
        (None, None) => return WriteFileResult::NoFilename,
    };
    let content = restore_line_endings(
        &state.current.text(),
        state.original_line_ending,
        state.had_trailing_newline,
    );
    match std::fs::write(&path, content.as_bytes()) {
        Ok(()) => {
            tracing::info!(target: "io", file = %path.display(), size_bytes = content.len(), "file_written");
            state.file_name = Some(path);
            state.dirty = false;
            WriteFileResult::Success
        }
        Err(e) => {
            tracing::error!(target: "io", file = %path.display(), ?e, "file_write_error");
            WriteFileResult::Error
        }
    }
}
