//! Status line composition.
//!
//! Format: `<name>[*] +A -R[ NN%][ | <message>]`.
//! * `<name>` is the base file name or `[No Name]`.
//! * `*` appears only when the current buffer has unsaved edits.
//! * `NN%` is shown while a pass is running and has reported progress.
//!
//! Two stages: `compose_status` produces ordered `StatusSegment`s and
//! `format_status` renders them.

use core_state::EditorState;
use std::borrow::Cow;

pub struct StatusContext<'a> {
    pub file_name: Option<&'a std::path::Path>,
    pub dirty: bool,
    pub added: usize,
    pub removed: usize,
    pub progress: Option<u8>,
    pub message: Option<&'a str>,
}

impl<'a> StatusContext<'a> {
    pub fn from_state(state: &'a EditorState) -> Self {
        Self {
            file_name: state.file_name.as_deref(),
            dirty: state.dirty,
            added: state.annotations.added().len(),
            removed: state.annotations.removed().len(),
            progress: state.progress,
            message: state.ephemeral_status.as_ref().map(|m| m.text.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    FileName(Cow<'a, str>),
    Counts { added: usize, removed: usize },
    Progress(u8),
    Message(&'a str),
}

pub fn compose_status<'a>(ctx: &'a StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    let name: Cow<'_, str> = match ctx.file_name.and_then(|p| p.file_name()) {
        Some(n) => n.to_string_lossy(),
        None => "[No Name]".into(),
    };
    let name = if ctx.dirty {
        format!("{name}*").into()
    } else {
        name
    };
    let mut out = Vec::with_capacity(4);
    out.push(StatusSegment::FileName(name));
    out.push(StatusSegment::Counts {
        added: ctx.added,
        removed: ctx.removed,
    });
    if let Some(p) = ctx.progress {
        out.push(StatusSegment::Progress(p));
    }
    if let Some(m) = ctx.message {
        out.push(StatusSegment::Message(m));
    }
    out
}

pub fn format_status(segments: &[StatusSegment<'_>]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(48);
    for seg in segments {
        match seg {
            StatusSegment::FileName(name) => s.push_str(name),
            StatusSegment::Counts { added, removed } => {
                let _ = write!(s, " +{added} -{removed}");
            }
            StatusSegment::Progress(p) => {
                let _ = write!(s, " {p}%");
            }
            StatusSegment::Message(m) => {
                s.push_str(" | ");
                s.push_str(m);
            }
        }
    }
    s
}

pub fn build_status(ctx: &StatusContext) -> String {
    format_status(&compose_status(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx<'a>() -> StatusContext<'a> {
        StatusContext {
            file_name: None,
            dirty: false,
            added: 0,
            removed: 0,
            progress: None,
            message: None,
        }
    }

    #[test]
    fn unnamed_clean() {
        assert_eq!(build_status(&ctx()), "[No Name] +0 -0");
    }

    #[test]
    fn named_dirty_with_progress_and_message() {
        let c = StatusContext {
            file_name: Some(Path::new("/tmp/src/main.py")),
            dirty: true,
            added: 3,
            removed: 1,
            progress: Some(42),
            message: Some("Saved"),
        };
        assert_eq!(build_status(&c), "main.py* +3 -1 42% | Saved");
    }

    #[test]
    fn progress_segment_only_when_reported() {
        let c = ctx();
        let segs = compose_status(&c);
        assert!(!segs.iter().any(|s| matches!(s, StatusSegment::Progress(_))));
    }

    #[test]
    fn from_state_reads_annotations() {
        let mut state = EditorState::default();
        state.reset_document("a\nb");
        state.dirty = true;
        let c = StatusContext::from_state(&state);
        assert_eq!(build_status(&c), "[No Name]* +0 -0");
    }
}
