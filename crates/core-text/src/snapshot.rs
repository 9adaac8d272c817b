//! Immutable line snapshots handed to background reconciliation passes.

use std::sync::Arc;

/// A single line plus its 0-based position in the owning snapshot.
///
/// Equality is exact string equality on `text`; position is not part of a
/// line's identity when comparing across sequences.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub index: usize,
    pub text: &'a str,
}

impl PartialEq for Line<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Line<'_> {}

/// Ordered, immutable sequence of lines captured at a point in time.
///
/// Cloning shares the backing storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot {
    lines: Arc<[String]>,
}

impl Default for BufferSnapshot {
    fn default() -> Self {
        Self::from_lines(std::iter::empty::<String>())
    }
}

impl BufferSnapshot {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let v: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self { lines: v.into() }
    }

    /// Split LF-separated text using the same line model as `Buffer`.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n'))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    pub fn line(&self, idx: usize) -> Option<Line<'_>> {
        self.get(idx).map(|text| Line { index: idx, text })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = Line<'_>> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, text)| Line { index, text })
    }

    /// LF-joined text without a trailing separator.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_matches_buffer_line_model() {
        let s = BufferSnapshot::from_text("a\nb\n");
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(2), Some(""));
        assert_eq!(BufferSnapshot::from_text("").len(), 1);
    }

    #[test]
    fn line_equality_ignores_position() {
        let a = BufferSnapshot::from_lines(["x", "y"]);
        let b = BufferSnapshot::from_lines(["y", "x"]);
        assert_eq!(a.line(0), b.line(1));
        assert_ne!(a.line(0), b.line(0));
    }

    #[test]
    fn equality_is_case_and_whitespace_sensitive() {
        let a = BufferSnapshot::from_lines(["Foo", "bar "]);
        let b = BufferSnapshot::from_lines(["foo", "bar"]);
        assert_ne!(a.line(0), b.line(0));
        assert_ne!(a.line(1), b.line(1));
    }

    #[test]
    fn clone_shares_storage() {
        let a = BufferSnapshot::from_lines(["x"]);
        let b = a.clone();
        assert!(std::ptr::eq(a.as_slice(), b.as_slice()));
        assert_eq!(a.to_text(), "x");
    }
}
