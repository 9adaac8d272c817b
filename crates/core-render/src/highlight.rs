//! Pluggable highlight rule table.
//!
//! An ordered list of `{matcher, class}` rules evaluated independently per
//! line. Rules never see more than one line and never touch reconciliation
//! state; swapping the table changes colors only.

use crate::style::{StyleLayer, StyleSpan, SyntaxClass};
use regex::Regex;
use std::ops::Range;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid highlight pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown highlight style `{0}`")]
    UnknownStyle(String),
}

/// Finds styled byte ranges inside a single line.
pub trait LineMatcher: Send + Sync {
    fn find_ranges(&self, text: &str, out: &mut Vec<Range<usize>>);
}

impl LineMatcher for Regex {
    fn find_ranges(&self, text: &str, out: &mut Vec<Range<usize>>) {
        out.extend(self.find_iter(text).map(|m| m.range()).filter(|r| !r.is_empty()));
    }
}

pub struct HighlightRule {
    matcher: Box<dyn LineMatcher>,
    class: SyntaxClass,
}

impl HighlightRule {
    pub fn new(matcher: impl LineMatcher + 'static, class: SyntaxClass) -> Self {
        Self {
            matcher: Box::new(matcher),
            class,
        }
    }

    pub fn regex(pattern: &str, class: SyntaxClass) -> Result<Self, RuleError> {
        let re = Regex::new(pattern).map_err(|source| RuleError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::new(re, class))
    }

    pub fn class(&self) -> SyntaxClass {
        self.class
    }
}

#[derive(Default)]
pub struct RuleTable {
    rules: Vec<HighlightRule>,
}

impl std::fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleTable")
            .field("rules", &self.rules.len())
            .finish()
    }
}

// Python-flavoured defaults: class headers, a handful of keywords, `def`
// headers, `#` comments and single-line triple-quoted strings.
const PYTHON_RULES: &[(&str, SyntaxClass)] = &[
    (r"^\s*class\s+\w+.*$", SyntaxClass::Class),
    (
        r"((from\s)|(import\s)|(\stry)|(True)|(False)|(\sif)|(\selif)|(\selse)|(\sexcept)|(\sfinally))",
        SyntaxClass::Keyword,
    ),
    (r"^\s*def\s+\w+\s*\(.*\)\s*:\s*$", SyntaxClass::Function),
    (r"(\s#.*$)", SyntaxClass::Comment),
    (r#"(('{3}|"{3}).*?('{3}|"{3}))"#, SyntaxClass::String),
];

impl RuleTable {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Table preloaded with the built-in rules.
    pub fn python_defaults() -> Self {
        let mut table = Self::new();
        for (pattern, class) in PYTHON_RULES {
            // Built-in patterns are covered by tests; a failure here is a programming error.
            if let Ok(rule) = HighlightRule::regex(pattern, *class) {
                table.push(rule);
            } else {
                tracing::error!(target: "render.highlight", pattern, "builtin_rule_invalid");
            }
        }
        table
    }

    pub fn push(&mut self, rule: HighlightRule) {
        self.rules.push(rule);
    }

    /// Append a regex rule using a configuration style name.
    pub fn push_pattern(&mut self, pattern: &str, style: &str) -> Result<(), RuleError> {
        let class =
            SyntaxClass::from_name(style).ok_or_else(|| RuleError::UnknownStyle(style.to_string()))?;
        self.push(HighlightRule::regex(pattern, class)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against one line, in table order.
    pub fn highlight_line(&self, line: usize, text: &str, out: &mut StyleLayer) {
        let mut ranges = Vec::new();
        for rule in &self.rules {
            ranges.clear();
            rule.matcher.find_ranges(text, &mut ranges);
            for r in &ranges {
                out.push(StyleSpan {
                    line,
                    start: r.start,
                    end: r.end,
                    class: rule.class,
                });
            }
        }
    }

    /// Evaluate the table over a sequence of lines.
    pub fn highlight<'a, I>(&self, lines: I) -> StyleLayer
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut layer = StyleLayer::new();
        for (idx, text) in lines.into_iter().enumerate() {
            self.highlight_line(idx, text, &mut layer);
        }
        layer
    }
}
