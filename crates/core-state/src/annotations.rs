//! Diff annotation store.
//!
//! Holds the added / removed line-number sets of the last applied pass plus
//! their display attributes. The two sets only ever change together:
//! [`DiffAnnotations::replace`] consumes one `ReconciliationResult` and swaps
//! both in a single assignment, so a reader can never observe the added set of
//! one pass next to the removed set of another.

use core_reconcile::{LineTag, ReconciliationResult};
use std::collections::BTreeSet;

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` (leading `#` optional).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Gutter / band colors per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffStyle {
    pub added: Rgb,
    pub removed: Rgb,
    pub gutter: Rgb,
}

impl Default for DiffStyle {
    fn default() -> Self {
        Self {
            added: Rgb(0xda, 0xe8, 0xbc),
            removed: Rgb(0xf2, 0x9b, 0x9b),
            gutter: Rgb(0xff, 0xd1, 0x41),
        }
    }
}

impl DiffStyle {
    pub fn color_for(&self, tag: LineTag) -> Rgb {
        match tag {
            LineTag::Added => self.added,
            LineTag::Removed => self.removed,
            LineTag::Unchanged => self.gutter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct TagSets {
    added: BTreeSet<usize>,
    removed: BTreeSet<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct DiffAnnotations {
    sets: TagSets,
    /// Number of replacements applied (0 = never populated).
    revision: u64,
    pub style: DiffStyle,
}

impl DiffAnnotations {
    pub fn new(style: DiffStyle) -> Self {
        Self {
            sets: TagSets::default(),
            revision: 0,
            style,
        }
    }

    /// Swap in the tags of a completed pass.
    pub fn replace(&mut self, result: &ReconciliationResult) {
        self.sets = TagSets {
            added: result.added().clone(),
            removed: result.removed().clone(),
        };
        self.revision += 1;
        tracing::trace!(
            target: "state.annotations",
            revision = self.revision,
            added = self.sets.added.len(),
            removed = self.sets.removed.len(),
            "annotations_replaced"
        );
    }

    /// Reset both sets to empty.
    pub fn clear(&mut self) {
        self.sets = TagSets::default();
        self.revision += 1;
    }

    pub fn added(&self) -> &BTreeSet<usize> {
        &self.sets.added
    }

    pub fn removed(&self) -> &BTreeSet<usize> {
        &self.sets.removed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.sets.added.is_empty() && self.sets.removed.is_empty()
    }

    pub fn is_added(&self, line_no: usize) -> bool {
        self.sets.added.contains(&line_no)
    }

    pub fn is_removed(&self, line_no: usize) -> bool {
        self.sets.removed.contains(&line_no)
    }

    /// Tag for a 1-based physical line number.
    pub fn tag(&self, line_no: usize) -> LineTag {
        if self.is_added(line_no) {
            LineTag::Added
        } else if self.is_removed(line_no) {
            LineTag::Removed
        } else {
            LineTag::Unchanged
        }
    }
}
