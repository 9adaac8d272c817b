//! Dual line-number gutter view-model.
//!
//! Derived purely from the reconciled line count and a tag lookup; holds no
//! state between frames. `new_number` skips removed lines, `old_number` skips
//! added lines.

use core_reconcile::{LineTag, ReconciliationResult};
use core_state::DiffAnnotations;

/// Anything that can answer "what is line N tagged as" (1-based).
pub trait TagSource {
    fn tag_of(&self, line_no: usize) -> LineTag;
}

impl TagSource for DiffAnnotations {
    fn tag_of(&self, line_no: usize) -> LineTag {
        self.tag(line_no)
    }
}

impl TagSource for ReconciliationResult {
    fn tag_of(&self, line_no: usize) -> LineTag {
        self.tag(line_no)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GutterRow {
    /// 1-based physical line in the reconciled text.
    pub physical: usize,
    pub tag: LineTag,
    pub new_number: Option<usize>,
    pub old_number: Option<usize>,
    pub marker: char,
}

pub fn marker_for(tag: LineTag) -> char {
    match tag {
        LineTag::Added => '+',
        LineTag::Removed => '-',
        LineTag::Unchanged => ' ',
    }
}

pub fn gutter_rows(line_count: usize, tags: &impl TagSource) -> Vec<GutterRow> {
    let mut rows = Vec::with_capacity(line_count);
    let mut added_before = 0usize;
    let mut removed_before = 0usize;
    for physical in 1..=line_count {
        let tag = tags.tag_of(physical);
        let new_number = (tag != LineTag::Removed).then(|| physical - removed_before);
        let old_number = (tag != LineTag::Added).then(|| physical - added_before);
        match tag {
            LineTag::Added => added_before += 1,
            LineTag::Removed => removed_before += 1,
            LineTag::Unchanged => {}
        }
        rows.push(GutterRow {
            physical,
            tag,
            new_number,
            old_number,
            marker: marker_for(tag),
        });
    }
    rows
}

/// Column width needed for the larger of the two counters.
pub fn number_width(rows: &[GutterRow]) -> usize {
    rows.iter()
        .flat_map(|r| [r.new_number, r.old_number])
        .flatten()
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1)
}

/// `" old  new m"` with blanks where a counter does not apply.
pub fn format_row(row: &GutterRow, width: usize) -> String {
    let cell = |n: Option<usize>| match n {
        Some(n) => format!("{n:>width$}"),
        None => " ".repeat(width),
    };
    format!("{} {} {}", cell(row.old_number), cell(row.new_number), row.marker)
}
