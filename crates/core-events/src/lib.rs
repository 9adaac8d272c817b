//! Core event types and channel helpers.
//!
//! One task (the interactive loop) owns every buffer and the annotation store.
//! Everything else talks to it by sending an [`Event`] over a bounded channel:
//! external edits, user commands, ticks, and the results of background
//! reconciliation passes.

use core_reconcile::ReconciliationResult;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

pub mod watch;

pub use watch::FileWatchSource;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// The loop consumes a bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Async sources use
// `send().await` (natural backpressure). The reconcile worker awaits its blocking task and posts
// the outcome with `send().await` because a finished pass must never be dropped; progress updates
// use `try_send` from the blocking thread and are discarded when the channel is full.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Relaxed atomic counters; inspected by tests and logged at shutdown.
// -------------------------------------------------------------------------------------------------
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static PROGRESS_DROPPED: AtomicU64 = AtomicU64::new(0);
pub static PASSES_STARTED: AtomicU64 = AtomicU64::new(0);
pub static PASSES_COALESCED: AtomicU64 = AtomicU64::new(0);
pub static PASSES_FAILED: AtomicU64 = AtomicU64::new(0);
pub static PASSES_STALE: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone)]
pub enum Event {
    Edit(EditEvent),
    Command(CommandEvent),
    Reconcile(ReconcileEvent),
    /// Periodic monotonic tick used to drive the change notifier's debounce.
    Tick,
    Shutdown,
}

/// Mutations of the current (edited) buffer originating outside the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// Replace the whole current text (already LF-normalized).
    ReplaceCurrent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    /// Clear current, base and original text.
    New,
    /// Adopt the current text as the new baseline.
    MakeOriginal,
    Open(PathBuf),
    /// Save the current text; `None` writes back to the opened file.
    Save(Option<PathBuf>),
    Quit,
}

/// Messages posted by background reconciliation passes.
///
/// `generation` identifies the state epoch the pass was started in; the loop
/// drops messages whose generation no longer matches (e.g. after "New").
#[derive(Debug, Clone)]
pub enum ReconcileEvent {
    Progress { generation: u64, percent: u8 },
    Finished {
        generation: u64,
        result: Box<ReconciliationResult>,
    },
    /// The pass produced no result (safety-limit overrun or a panic inside
    /// the worker). The displayed base is left as it was.
    Failed { generation: u64, reason: String },
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------
// Each source is responsible for its own async task lifecycle; on channel send failure (consumer
// dropped) it must terminate promptly.

/// Trait implemented by any async event producer. Implementors usually hold configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task, returning a JoinHandle. Implementors should
    /// stop when `tx.send(..).await` returns Err (channel closed) or on their own internal stop
    /// condition.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// `Sender` clone; during shutdown the caller drops its final clone before awaiting the
    /// handles so the sources observe the closed channel and exit cooperatively.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        // Drain so duplicate spawns are prevented if called twice.
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Built-in monotonic tick source. Emits `Event::Tick` every configured interval.
pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}
