//! View-model and presentation for the reconciled buffer.
//!
//! Everything here is derived from `EditorState` after a pass has been
//! applied; nothing in this crate feeds back into reconciliation.
//!
//! Components:
//! - `gutter`: dual line-number rows (new numbering skips removed lines, old
//!   numbering skips added lines) plus the `+`/`-` marker column.
//! - `highlight`: ordered per-line rule table producing syntax spans.
//! - `style`: syntax classes and the span layer the rule table fills.
//! - `status`: status line segments (file, dirty flag, counts, progress).
//! - `sink`: `RenderFrame` assembly and the `RenderSink` boundary.

pub mod gutter;
pub mod highlight;
pub mod sink;
pub mod status;
pub mod style;

pub use gutter::{GutterRow, TagSource, gutter_rows};
pub use highlight::{HighlightRule, LineMatcher, RuleError, RuleTable};
pub use sink::{RenderFrame, RenderSink, TextSink};
pub use style::{StyleLayer, StyleSpan, SyntaxClass};
