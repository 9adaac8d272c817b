//! Pass output: reconciled base lines plus add/remove tags.

use core_text::BufferSnapshot;
use std::collections::BTreeSet;

/// Classification of one output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineTag {
    /// Present in both sequences.
    Unchanged,
    /// Introduced by the current text.
    Added,
    /// Present in the base but dropped from the current text; kept in the output.
    Removed,
}

/// Counters collected while a pass runs (trace / telemetry only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassStats {
    pub matched: usize,
    pub added: usize,
    pub removed: usize,
    /// Lines emitted (the safety counter).
    pub steps: usize,
    /// Line comparisons performed by rescue lookaheads.
    pub probes: usize,
    /// True once the lookahead budget ran out and rescues stopped scanning.
    pub budget_exhausted: bool,
    /// True when the pass returned the base untouched (no baseline yet).
    pub short_circuit: bool,
}

/// Outcome of one reconciliation pass.
///
/// Invariants (upheld by construction inside this crate):
/// - `added` and `removed` are disjoint.
/// - every line number in either set is in `1..=lines.len()`.
/// - `lines.len() == matched + added + removed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    lines: Vec<String>,
    added: BTreeSet<usize>,
    removed: BTreeSet<usize>,
    stats: PassStats,
}

impl ReconciliationResult {
    /// Result that leaves `base` as is with no annotations.
    pub fn unchanged(base: &BufferSnapshot) -> Self {
        Self {
            lines: base.as_slice().to_vec(),
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            stats: PassStats {
                matched: base.len(),
                short_circuit: true,
                ..PassStats::default()
            },
        }
    }

    pub(crate) fn from_parts(
        lines: Vec<String>,
        added: BTreeSet<usize>,
        removed: BTreeSet<usize>,
        stats: PassStats,
    ) -> Self {
        debug_assert!(added.is_disjoint(&removed));
        debug_assert!(
            added
                .iter()
                .chain(removed.iter())
                .all(|n| *n >= 1 && *n <= lines.len())
        );
        debug_assert_eq!(lines.len(), stats.matched + stats.added + stats.removed);
        Self {
            lines,
            added,
            removed,
            stats,
        }
    }

    /// Reconciled base lines in display order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 1-based line numbers tagged added.
    pub fn added(&self) -> &BTreeSet<usize> {
        &self.added
    }

    /// 1-based line numbers tagged removed.
    pub fn removed(&self) -> &BTreeSet<usize> {
        &self.removed
    }

    pub fn stats(&self) -> PassStats {
        self.stats
    }

    /// Tag for a 1-based line number; out-of-range numbers are `Unchanged`.
    pub fn tag(&self, line_no: usize) -> LineTag {
        if self.added.contains(&line_no) {
            LineTag::Added
        } else if self.removed.contains(&line_no) {
            LineTag::Removed
        } else {
            LineTag::Unchanged
        }
    }

    /// Reconstructed text: lines joined by `\n`, no separator after the last line.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Split into owned parts (lines, added, removed).
    pub fn into_parts(self) -> (Vec<String>, BTreeSet<usize>, BTreeSet<usize>) {
        (self.lines, self.added, self.removed)
    }
}
