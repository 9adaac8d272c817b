//! Line ending detection and normalization.
//!
//! Buffers store LF-only text. On load we record the dominant original style
//! and whether the file ended with a newline so that a save can restore it.

/// Line ending style detected from source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Output of [`normalize_line_endings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub normalized: String,
    pub original: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed: bool,
}

impl NormalizedText {
    /// Document text: the normalized text minus one final separator, which
    /// `had_trailing_newline` remembers for saving.
    pub fn body(&self) -> &str {
        if self.had_trailing_newline {
            self.normalized.strip_suffix('\n').unwrap_or(&self.normalized)
        } else {
            &self.normalized
        }
    }
}

#[derive(Default)]
struct EndingCounts {
    crlf: usize,
    lf: usize,
    cr: usize,
}

impl EndingCounts {
    /// Most frequent style; ties go to CRLF, then LF. No separators at all means LF.
    fn dominant(&self) -> LineEnding {
        if self.crlf >= self.lf && self.crlf >= self.cr && self.crlf > 0 {
            LineEnding::Crlf
        } else if self.cr > self.lf {
            LineEnding::Cr
        } else {
            LineEnding::Lf
        }
    }

    fn styles_seen(&self) -> usize {
        [self.crlf, self.lf, self.cr].iter().filter(|&&c| c > 0).count()
    }
}

/// Convert CRLF and lone CR to LF, remembering the dominant style.
///
/// `mixed` is set whenever more than one style occurs in `input`.
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let mut counts = EndingCounts::default();
    let mut normalized = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                counts.crlf += 1;
                normalized.push('\n');
            }
            '\r' => {
                counts.cr += 1;
                normalized.push('\n');
            }
            '\n' => {
                counts.lf += 1;
                normalized.push('\n');
            }
            other => normalized.push(other),
        }
    }
    NormalizedText {
        had_trailing_newline: normalized.ends_with('\n'),
        original: counts.dominant(),
        mixed: counts.styles_seen() > 1,
        normalized,
    }
}

/// Re-expand LF-only text using `ending`, appending a final separator when
/// `trailing_newline` is set and the text does not already end in one.
pub fn restore_line_endings(text: &str, ending: LineEnding, trailing_newline: bool) -> String {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let mut out = body.replace('\n', ending.as_str());
    if trailing_newline {
        out.push_str(ending.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_drops_one_trailing_separator() {
        assert_eq!(normalize_line_endings("a\r\nb\r\n").body(), "a\nb");
        assert_eq!(normalize_line_endings("a\n\n").body(), "a\n");
        assert_eq!(normalize_line_endings("a").body(), "a");
        assert_eq!(normalize_line_endings("").body(), "");
    }

    #[test]
    fn normalize_crlf() {
        let n = normalize_line_endings("a\r\nb\r\n");
        assert_eq!(n.normalized, "a\nb\n");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(n.had_trailing_newline);
        assert!(!n.mixed);
    }

    #[test]
    fn normalize_cr() {
        let n = normalize_line_endings("a\rb\r");
        assert_eq!(n.normalized, "a\nb\n");
        assert_eq!(n.original, LineEnding::Cr);
    }

    #[test]
    fn normalize_mixed_majority() {
        let n = normalize_line_endings("a\r\nb\nc\r\n");
        assert_eq!(n.normalized, "a\nb\nc\n");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(n.mixed);
    }

    #[test]
    fn tie_prefers_crlf_and_counts_as_mixed() {
        let n = normalize_line_endings("a\r\nb\nc");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(n.mixed);
        let n = normalize_line_endings("a\nb\rc");
        assert_eq!(n.original, LineEnding::Lf);
        assert_eq!(normalize_line_endings("plain").original, LineEnding::Lf);
    }

    #[test]
    fn normalize_trailing_newline_absent() {
        let n = normalize_line_endings("a\r\nb");
        assert_eq!(n.normalized, "a\nb");
        assert!(!n.had_trailing_newline);
    }

    #[test]
    fn normalize_unicode_crlf_preserves_multibyte() {
        let n = normalize_line_endings("⚙️ Gear\r\nNext\r\n");
        assert_eq!(n.normalized, "⚙️ Gear\nNext\n");
    }

    #[test]
    fn restore_round_trips_crlf() {
        let n = normalize_line_endings("x\r\ny\r\n");
        let restored = restore_line_endings(&n.normalized, n.original, n.had_trailing_newline);
        assert_eq!(restored, "x\r\ny\r\n");
    }

    #[test]
    fn restore_without_trailing_newline() {
        assert_eq!(restore_line_endings("x\ny", LineEnding::Crlf, false), "x\r\ny");
        assert_eq!(restore_line_endings("", LineEnding::Lf, false), "");
    }
}
