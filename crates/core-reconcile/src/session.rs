//! Per-pass cursor state.
//!
//! A session owns nothing but borrowed line slices plus its accumulators, so
//! it can only exist for the duration of a single pass.

use crate::ReconcileError;
use crate::progress::{ProgressSink, percent};
use crate::result::{LineTag, PassStats, ReconciliationResult};
use std::collections::BTreeSet;
use tracing::{debug, trace};

pub struct ReconciliationSession<'a> {
    base: &'a [String],
    current: &'a [String],
    /// Base cursor.
    i: usize,
    /// Current cursor.
    j: usize,
    limit: usize,
    window: Option<usize>,
    /// Lookahead comparisons left for the whole pass.
    budget: usize,
    lines: Vec<String>,
    added: BTreeSet<usize>,
    removed: BTreeSet<usize>,
    stats: PassStats,
    last_percent: Option<u8>,
}

impl<'a> ReconciliationSession<'a> {
    pub fn new(
        base: &'a [String],
        current: &'a [String],
        limit: usize,
        window: Option<usize>,
        lookahead_budget: usize,
    ) -> Self {
        Self {
            base,
            current,
            i: 0,
            j: 0,
            limit,
            window,
            budget: lookahead_budget,
            lines: Vec::with_capacity(base.len().max(current.len())),
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            stats: PassStats::default(),
            last_percent: None,
        }
    }

    /// Drive the alignment to completion.
    pub fn run(
        mut self,
        progress: &dyn ProgressSink,
    ) -> Result<ReconciliationResult, ReconcileError> {
        let n = self.base.len();
        let m = self.current.len();
        while self.i < n || self.j < m {
            if self.i >= n {
                self.emit(self.j, LineTag::Added)?;
                self.j += 1;
            } else if self.j >= m {
                self.emit(self.i, LineTag::Removed)?;
                self.i += 1;
            } else if self.base[self.i] == self.current[self.j] {
                self.emit(self.i, LineTag::Unchanged)?;
                self.i += 1;
                self.j += 1;
            } else {
                self.rescue()?;
            }
            self.report(progress);
        }
        self.report(progress);
        Ok(ReconciliationResult::from_parts(
            self.lines,
            self.added,
            self.removed,
            self.stats,
        ))
    }

    /// Mismatch at `(i, j)`: insertion run, deletion run, or paired replacement.
    fn rescue(&mut self) -> Result<(), ReconcileError> {
        let (i, j) = (self.i, self.j);
        let (base, current) = (self.base, self.current);
        if let Some(k) = self.find(current, j + 1, &base[i]) {
            trace!(target: "reconcile.session", base = i, from = j, to = k, "insertion_run");
            for idx in j..k {
                self.emit(idx, LineTag::Added)?;
            }
            self.j = k;
            return Ok(());
        }
        if let Some(k) = self.find(base, i + 1, &current[j]) {
            trace!(target: "reconcile.session", current = j, from = i, to = k, "deletion_run");
            for idx in i..k {
                self.emit(idx, LineTag::Removed)?;
            }
            self.i = k;
            return Ok(());
        }
        trace!(target: "reconcile.session", base = i, current = j, "replacement");
        self.emit(j, LineTag::Added)?;
        self.emit(i, LineTag::Removed)?;
        self.i += 1;
        self.j += 1;
        Ok(())
    }

    /// Index of the first line equal to `needle` in `hay[from..]`, scanning at
    /// most `window` lines and never more than the remaining budget.
    fn find(&mut self, hay: &[String], from: usize, needle: &str) -> Option<usize> {
        if from >= hay.len() {
            return None;
        }
        let mut end = match self.window {
            Some(w) => from.saturating_add(w).min(hay.len()),
            None => hay.len(),
        };
        if end - from > self.budget {
            end = from + self.budget;
            if !self.stats.budget_exhausted {
                self.stats.budget_exhausted = true;
                debug!(
                    target: "reconcile.session",
                    base = self.i,
                    current = self.j,
                    probes = self.stats.probes,
                    "lookahead_budget_exhausted"
                );
            }
        }
        for (offset, line) in hay[from..end].iter().enumerate() {
            self.stats.probes += 1;
            self.budget -= 1;
            if line == needle {
                return Some(from + offset);
            }
        }
        None
    }

    /// Append one line. `idx` indexes `current` for `Added`, `base` otherwise.
    fn emit(&mut self, idx: usize, tag: LineTag) -> Result<(), ReconcileError> {
        self.stats.steps += 1;
        if self.stats.steps > self.limit {
            return Err(ReconcileError::SafetyLimitExceeded {
                limit: self.limit,
                emitted: self.stats.steps,
            });
        }
        let source = match tag {
            LineTag::Added => self.current,
            LineTag::Removed | LineTag::Unchanged => self.base,
        };
        self.lines.push(source[idx].clone());
        let line_no = self.lines.len();
        match tag {
            LineTag::Added => {
                self.added.insert(line_no);
                self.stats.added += 1;
            }
            LineTag::Removed => {
                self.removed.insert(line_no);
                self.stats.removed += 1;
            }
            LineTag::Unchanged => self.stats.matched += 1,
        }
        Ok(())
    }

    fn report(&mut self, progress: &dyn ProgressSink) {
        let p = percent(self.i, self.base.len());
        if self.last_percent.is_some_and(|last| last >= p) {
            return;
        }
        self.last_percent = Some(p);
        progress.report(p);
    }
}
