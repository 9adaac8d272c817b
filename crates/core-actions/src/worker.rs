//! Background reconcile worker.
//!
//! A pass runs on tokio's blocking pool against the immutable snapshots in a
//! `PassRequest`; it never touches live state. The outcome is posted back to
//! the loop as a `ReconcileEvent`. Overruns and panics are contained here and
//! surface only as `ReconcileEvent::Failed`.

use core_events::{
    CHANNEL_SEND_FAILURES, Event, PASSES_FAILED, PASSES_STARTED, PROGRESS_DROPPED, ReconcileEvent,
};
use core_reconcile::{ProgressSink, ReconcileError, ReconciliationResult, Reconciler};
use core_state::PassRequest;
use core_text::BufferSnapshot;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// The computation a worker runs for each pass.
pub trait PassRunner: Send + Sync + 'static {
    fn run_pass(
        &self,
        base: &BufferSnapshot,
        current: &BufferSnapshot,
        progress: &dyn ProgressSink,
    ) -> Result<ReconciliationResult, ReconcileError>;
}

impl PassRunner for Reconciler {
    fn run_pass(
        &self,
        base: &BufferSnapshot,
        current: &BufferSnapshot,
        progress: &dyn ProgressSink,
    ) -> Result<ReconciliationResult, ReconcileError> {
        self.run(base, current, progress)
    }
}

struct ChannelProgress {
    tx: Sender<Event>,
    generation: u64,
}

impl ProgressSink for ChannelProgress {
    fn report(&self, percent: u8) {
        let ev = Event::Reconcile(ReconcileEvent::Progress {
            generation: self.generation,
            percent,
        });
        if self.tx.try_send(ev).is_err() {
            PROGRESS_DROPPED.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Clone)]
pub struct ReconcileWorker {
    runner: Arc<dyn PassRunner>,
    tx: Sender<Event>,
}

impl ReconcileWorker {
    pub fn new(reconciler: Reconciler, tx: Sender<Event>) -> Self {
        Self::with_runner(Arc::new(reconciler), tx)
    }

    pub fn with_runner(runner: Arc<dyn PassRunner>, tx: Sender<Event>) -> Self {
        Self { runner, tx }
    }

    /// Start a pass. The caller is responsible for the single-flight gate.
    pub fn spawn(&self, request: PassRequest) -> JoinHandle<()> {
        PASSES_STARTED.fetch_add(1, Ordering::Relaxed);
        let runner = Arc::clone(&self.runner);
        let tx = self.tx.clone();
        let PassRequest {
            generation,
            base,
            current,
        } = request;
        debug!(
            target: "reconcile.worker",
            generation,
            base_lines = base.len(),
            current_lines = current.len(),
            "reconcile_task_spawned"
        );
        let progress = ChannelProgress {
            tx: tx.clone(),
            generation,
        };
        tokio::spawn(async move {
            let task =
                tokio::task::spawn_blocking(move || runner.run_pass(&base, &current, &progress));
            let event = match task.await {
                Ok(Ok(result)) => ReconcileEvent::Finished {
                    generation,
                    result: Box::new(result),
                },
                Ok(Err(err)) => {
                    PASSES_FAILED.fetch_add(1, Ordering::Relaxed);
                    warn!(target: "reconcile.worker", generation, %err, "reconcile_overrun_keep_base");
                    ReconcileEvent::Failed {
                        generation,
                        reason: err.to_string(),
                    }
                }
                Err(join_err) => {
                    PASSES_FAILED.fetch_add(1, Ordering::Relaxed);
                    error!(
                        target: "reconcile.worker",
                        generation,
                        panic = join_err.is_panic(),
                        error = %join_err,
                        "reconcile_task_failed"
                    );
                    ReconcileEvent::Failed {
                        generation,
                        reason: join_err.to_string(),
                    }
                }
            };
            if tx.send(Event::Reconcile(event)).await.is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            }
        })
    }
}
