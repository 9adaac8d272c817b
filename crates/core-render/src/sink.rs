//! Render sink boundary.
//!
//! A `RenderFrame` is the complete view-model for one redraw: reconciled
//! lines, gutter rows, syntax spans and the status string. Sinks only
//! present frames; they never reach back into editor state.

use crate::gutter::{GutterRow, format_row, gutter_rows, number_width};
use crate::highlight::RuleTable;
use crate::status::{StatusContext, build_status};
use crate::style::StyleLayer;
use anyhow::Result;
use core_reconcile::LineTag;
use core_state::{DiffStyle, EditorState, Rgb};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::Write;

#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub lines: Vec<String>,
    pub gutter: Vec<GutterRow>,
    pub spans: StyleLayer,
    pub style: DiffStyle,
    pub status: String,
}

impl RenderFrame {
    pub fn build(state: &EditorState, rules: &RuleTable) -> Self {
        let lines: Vec<String> = state.base.lines().collect();
        let gutter = gutter_rows(lines.len(), &state.annotations);
        let spans = rules.highlight(lines.iter().map(String::as_str));
        let status = build_status(&StatusContext::from_state(state));
        tracing::trace!(
            target: "render.frame",
            lines = lines.len(),
            spans = spans.spans.len(),
            revision = state.annotations.revision(),
            "frame_built"
        );
        Self {
            lines,
            gutter,
            spans,
            style: state.annotations.style,
            status,
        }
    }
}

pub trait RenderSink {
    fn present(&mut self, frame: &RenderFrame) -> Result<()>;
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

/// Line-oriented sink writing gutter, text and status to any `Write`.
///
/// With `color` off the output is plain text, which is what the one-shot
/// CLI and tests consume.
pub struct TextSink<W: Write> {
    out: W,
    color: bool,
    clear: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            clear: false,
        }
    }

    /// Clear the terminal and home the cursor before each frame.
    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, frame: &RenderFrame, idx: usize, width: usize) -> Result<()> {
        let row = &frame.gutter[idx];
        let text = frame.lines[idx].as_str();
        let gutter = format_row(row, width);
        if !self.color {
            writeln!(self.out, "{gutter} {text}")?;
            return Ok(());
        }
        queue!(
            self.out,
            SetForegroundColor(Color::Black),
            SetBackgroundColor(to_color(frame.style.gutter)),
            Print(gutter),
            ResetColor,
            Print(' ')
        )?;
        let band = match row.tag {
            LineTag::Unchanged => None,
            tag => Some(to_color(frame.style.color_for(tag))),
        };
        if let Some(bg) = band {
            queue!(self.out, SetBackgroundColor(bg))?;
        }
        for (run, class) in frame.spans.runs(idx, text) {
            match class {
                Some(c) => queue!(self.out, SetForegroundColor(c.color()), Print(run))?,
                None => queue!(self.out, SetForegroundColor(Color::Reset), Print(run))?,
            }
        }
        queue!(self.out, ResetColor, Print('\n'))?;
        Ok(())
    }
}

impl<W: Write> RenderSink for TextSink<W> {
    fn present(&mut self, frame: &RenderFrame) -> Result<()> {
        if self.clear {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        let width = number_width(&frame.gutter);
        for idx in 0..frame.lines.len() {
            self.write_line(frame, idx, width)?;
        }
        writeln!(self.out, "{}", frame.status)?;
        self.out.flush()?;
        Ok(())
    }
}
