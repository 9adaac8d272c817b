//! Commands, file I/O and the background reconcile worker.
//!
//! Everything here runs on (or is spawned from) the interactive loop:
//! - `commands`: "New", "Make Original", open and save applied to `EditorState`.
//! - `io_ops`: plain UTF-8 load/save with line-ending bookkeeping.
//! - `worker`: runs passes on tokio's blocking pool and posts results back.

pub mod commands;
pub mod io_ops;
pub mod worker;

pub use commands::{DispatchResult, apply_open, dispatch, make_original, new_document};
pub use io_ops::{OpenFileResult, OpenSuccess, WriteFileResult, open_file, write_file};
pub use worker::{PassRunner, ReconcileWorker};
