//! Rope-backed line store.
//!
//! A `Buffer` owns the live text of one editor pane (the edited "current"
//! text or the read-only "base" text). Lines are LF-separated; callers
//! normalize CRLF / CR input through [`normalize_line_endings`] before
//! constructing a buffer.
//!
//! Line model:
//! - The empty string is a single empty line (`line_count() == 1`).
//! - A trailing `\n` produces a final empty line, so `"a\nb\n"` holds three
//!   lines. This mirrors block semantics of typical text widgets and keeps the
//!   "no real baseline yet" case (`<= 1` line) cheap to detect.
//! - `line(idx)` never includes the separator.
//! - `\n` is the only break. Form feed, vertical tab, NEL and the Unicode
//!   line/paragraph separators are ordinary characters inside a line, which
//!   keeps `Buffer` and [`BufferSnapshot::from_text`] in agreement.
//!
//! Snapshots: reconciliation runs off the interactive thread, so it never
//! reads a `Buffer` directly. [`Buffer::snapshot`] copies the lines into an
//! immutable, cheaply clonable [`BufferSnapshot`] on the owning thread.

use anyhow::Result;
use ropey::Rope;

pub mod line_ending;
pub mod snapshot;

pub use line_ending::{LineEnding, NormalizedText, normalize_line_endings, restore_line_endings};
pub use snapshot::{BufferSnapshot, Line};

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("lines", &self.line_count())
            .field("bytes", &self.rope.len_bytes())
            .finish()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
        })
    }

    /// Empty buffer (one empty line).
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            rope: Rope::new(),
            name: name.into(),
        }
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Return the requested line as an owned `String` without its trailing newline.
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let mut s = self.rope.line(idx).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// Sequential access over all lines (separator stripped).
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.rope.lines().map(|l| {
            let mut s = l.to_string();
            if s.ends_with('\n') {
                s.pop();
            }
            s
        })
    }

    /// Full buffer contents.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// True when the buffer holds no bytes at all.
    pub fn is_empty_text(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Replace the entire contents.
    pub fn set_text(&mut self, content: &str) {
        self.rope = Rope::from_str(content);
    }

    /// Remove all contents (leaves a single empty line).
    pub fn clear(&mut self) {
        self.rope = Rope::new();
    }

    /// Copy the current lines into an immutable snapshot.
    ///
    /// Must be called on the thread that owns the buffer; the returned value is
    /// `Send + Sync` and shares nothing with the rope.
    pub fn snapshot(&self) -> BufferSnapshot {
        let snap = BufferSnapshot::from_lines(self.lines());
        tracing::trace!(target: "text.snapshot", buffer = %self.name, lines = snap.len(), "snapshot_taken");
        snap
    }
}
