//! Style layer: syntax classes and line-local spans.
//!
//! Design invariants:
//! * Spans are line-local (identified by 0-based `line`). Ranges are half-open
//!   byte ranges `[start, end)` on `char` boundaries of that line.
//! * Overlaps resolve by order: a later span wins over an earlier one for the
//!   bytes they share (matching how the rule table applies rules in order).
//! * A single `StyleLayer` is reused per frame via `clear()`.

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxClass {
    Class,
    Keyword,
    Function,
    Comment,
    String,
}

impl SyntaxClass {
    /// Parse the lowercase name used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "class" => Some(SyntaxClass::Class),
            "keyword" => Some(SyntaxClass::Keyword),
            "function" => Some(SyntaxClass::Function),
            "comment" => Some(SyntaxClass::Comment),
            "string" | "docstring" => Some(SyntaxClass::String),
            _ => None,
        }
    }

    /// Terminal foreground color.
    pub fn color(self) -> Color {
        match self {
            SyntaxClass::Class | SyntaxClass::Function => Color::Blue,
            SyntaxClass::Keyword => Color::Red,
            SyntaxClass::Comment | SyntaxClass::String => Color::Rgb {
                r: 0x99,
                g: 0x99,
                b: 0x99,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSpan {
    pub line: usize,
    pub start: usize, // inclusive byte
    pub end: usize,   // exclusive byte
    pub class: SyntaxClass,
}

impl StyleSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default, Debug, Clone)]
pub struct StyleLayer {
    pub spans: Vec<StyleSpan>,
}

impl StyleLayer {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }
    pub fn clear(&mut self) {
        self.spans.clear();
    }
    pub fn push(&mut self, span: StyleSpan) {
        self.spans.push(span);
    }
    pub fn for_line(&self, line: usize) -> impl Iterator<Item = &StyleSpan> {
        self.spans.iter().filter(move |s| s.line == line)
    }

    /// Split `text` (line `line`) into runs of uniform class, later spans winning.
    pub fn runs<'t>(&self, line: usize, text: &'t str) -> Vec<(&'t str, Option<SyntaxClass>)> {
        let mut classes: Vec<Option<SyntaxClass>> = vec![None; text.len()];
        for span in self.for_line(line) {
            let end = span.end.min(text.len());
            for slot in classes.iter_mut().take(end).skip(span.start) {
                *slot = Some(span.class);
            }
        }
        let mut out = Vec::new();
        let mut start = 0usize;
        for idx in 1..=text.len() {
            if idx == text.len() || classes[idx] != classes[start] {
                out.push((&text[start..idx], classes[start]));
                start = idx;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_later_span_wins() {
        let mut layer = StyleLayer::new();
        layer.push(StyleSpan {
            line: 0,
            start: 0,
            end: 6,
            class: SyntaxClass::Keyword,
        });
        layer.push(StyleSpan {
            line: 0,
            start: 3,
            end: 9,
            class: SyntaxClass::Comment,
        });
        let runs = layer.runs(0, "abcdefghij");
        assert_eq!(
            runs,
            vec![
                ("abc", Some(SyntaxClass::Keyword)),
                ("defghi", Some(SyntaxClass::Comment)),
                ("j", None),
            ]
        );
    }

    #[test]
    fn runs_of_empty_line() {
        assert!(StyleLayer::new().runs(0, "").is_empty());
    }

    #[test]
    fn class_names() {
        assert_eq!(SyntaxClass::from_name("docstring"), Some(SyntaxClass::String));
        assert_eq!(SyntaxClass::from_name("bogus"), None);
    }
}
