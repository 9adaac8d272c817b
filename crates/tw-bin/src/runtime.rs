//! Interactive loop: the single owner of `EditorState`.
//!
//! Every mutation of the buffers and the annotation store happens here, in
//! event order. Passes are started only when the change notifier says so and
//! their results come back as `Event::Reconcile`.

use anyhow::Result;
use core_actions::{ReconcileWorker, dispatch};
use core_events::{
    CommandEvent, EditEvent, Event, PASSES_COALESCED, PASSES_STALE, ReconcileEvent,
};
use core_render::{RenderFrame, RenderSink, RuleTable};
use core_state::{ApplyOutcome, EditorState, NotifyDecision};
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Exit once no pass is running or scheduled; render a single frame.
    OneShot,
    /// Keep running until Ctrl-C / quit; render after every applied change.
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Idle,
    CommandQuit,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::Idle => "idle",
            ShutdownReason::CommandQuit => "command_quit",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

enum LoopControl {
    Continue { render: bool },
    Break { reason: ShutdownReason },
}

pub struct EditorRuntime {
    pub state: EditorState,
    mode: RunMode,
    worker: ReconcileWorker,
    rules: RuleTable,
    sink: Box<dyn RenderSink + Send>,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<JoinHandle<()>>,
    frames: u64,
}

impl EditorRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: EditorState,
        mode: RunMode,
        worker: ReconcileWorker,
        rules: RuleTable,
        sink: Box<dyn RenderSink + Send>,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        source_handles: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            state,
            mode,
            worker,
            rules,
            sink,
            rx,
            tx: Some(tx),
            source_handles,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Nothing running and nothing scheduled.
    fn settled(&self) -> bool {
        !self.state.notifier.in_flight() && self.state.notifier.deadline().is_none()
    }

    pub async fn run(&mut self) -> Result<ShutdownReason> {
        if self.mode == RunMode::Watch {
            self.render();
        }

        let loop_span = tracing::debug_span!(target: "runtime", "event_loop", mode = ?self.mode);
        let _enter_loop = loop_span.enter();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        loop {
            if self.mode == RunMode::OneShot && self.settled() {
                shutdown_reason = ShutdownReason::Idle;
                break;
            }
            let Some(event) = self.rx.recv().await else {
                break;
            };
            let control = match event {
                Event::Edit(edit) => self.handle_edit(&edit),
                Event::Command(cmd) => self.handle_command(cmd),
                Event::Reconcile(rec) => self.handle_reconcile(&rec),
                Event::Tick => self.handle_tick(),
                Event::Shutdown => LoopControl::Break {
                    reason: ShutdownReason::ShutdownEvent,
                },
            };
            match control {
                LoopControl::Break { reason } => {
                    shutdown_reason = reason;
                    break;
                }
                LoopControl::Continue { render } => {
                    if render && self.mode == RunMode::Watch {
                        self.render();
                    }
                }
            }
        }

        if self.mode == RunMode::OneShot {
            self.render();
        }
        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(shutdown_reason)
    }

    /// Report an edit that already landed in `state.current`.
    pub fn notify_change(&mut self) {
        match self.state.notifier.on_change(Instant::now()) {
            NotifyDecision::Start => self.start_pass(),
            NotifyDecision::Deferred => trace!(target: "runtime", "pass_deferred"),
            NotifyDecision::Coalesced => {
                PASSES_COALESCED.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn start_pass(&mut self) {
        let request = self.state.pass_request();
        debug!(target: "runtime", generation = request.generation, "pass_start");
        // Fire and forget: the outcome arrives as an event.
        drop(self.worker.spawn(request));
    }

    fn handle_edit(&mut self, edit: &EditEvent) -> LoopControl {
        match edit {
            EditEvent::ReplaceCurrent(text) => {
                if self.state.replace_current(text) {
                    self.notify_change();
                }
            }
        }
        LoopControl::Continue { render: false }
    }

    fn handle_command(&mut self, cmd: CommandEvent) -> LoopControl {
        let result = dispatch(cmd, &mut self.state);
        if result.quit {
            return LoopControl::Break {
                reason: ShutdownReason::CommandQuit,
            };
        }
        LoopControl::Continue {
            render: result.dirty,
        }
    }

    fn handle_reconcile(&mut self, event: &ReconcileEvent) -> LoopControl {
        match event {
            ReconcileEvent::Progress {
                generation,
                percent,
            } => {
                self.state.record_progress(*generation, *percent);
                LoopControl::Continue { render: false }
            }
            ReconcileEvent::Finished { generation, result } => {
                let rerun = self.state.notifier.complete(Instant::now());
                let applied = match self.state.apply_result(*generation, result) {
                    ApplyOutcome::Applied => true,
                    ApplyOutcome::Stale => {
                        PASSES_STALE.fetch_add(1, Ordering::Relaxed);
                        false
                    }
                };
                if rerun {
                    self.start_pass();
                }
                LoopControl::Continue { render: applied }
            }
            ReconcileEvent::Failed { generation, reason } => {
                warn!(target: "runtime", generation, reason = reason.as_str(), "pass_no_result");
                self.state.progress = None;
                if self.state.notifier.complete(Instant::now()) {
                    self.start_pass();
                }
                LoopControl::Continue { render: false }
            }
        }
    }

    fn handle_tick(&mut self) -> LoopControl {
        let now = Instant::now();
        if self.state.notifier.poll(now) {
            self.start_pass();
        }
        LoopControl::Continue {
            render: self.state.tick_ephemeral(now),
        }
    }

    fn render(&mut self) {
        let frame = RenderFrame::build(&self.state, &self.rules);
        match self.sink.present(&frame) {
            Ok(()) => self.frames += 1,
            Err(e) => error!(target: "render", ?e, "render_failed"),
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if let Some(tx) = self.tx.take() {
            trace!(target: "runtime.shutdown", reason = reason.as_str(), "dropping_runtime_sender");
            drop(tx);
        }
        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(())) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }
        log_shutdown_stage(reason, "complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_reconcile::Reconciler;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        frames: Arc<Mutex<Vec<RenderFrame>>>,
    }

    impl RenderSink for Captured {
        fn present(&mut self, frame: &RenderFrame) -> Result<()> {
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    fn runtime(mode: RunMode, state: EditorState) -> (EditorRuntime, Captured, mpsc::Sender<Event>) {
        let (tx, rx) = mpsc::channel(64);
        let worker = ReconcileWorker::new(Reconciler::default(), tx.clone());
        let captured = Captured::default();
        let rt = EditorRuntime::new(
            state,
            mode,
            worker,
            RuleTable::new(),
            Box::new(captured.clone()),
            tx.clone(),
            rx,
            Vec::new(),
        );
        (rt, captured, tx)
    }

    #[tokio::test]
    async fn one_shot_applies_pass_and_renders_once() {
        let mut state = EditorState::default();
        state.reset_document("a\nb\nc");
        state.replace_current("a\nc\nd");
        let (mut rt, captured, _tx) = runtime(RunMode::OneShot, state);
        rt.notify_change();
        let reason = tokio::time::timeout(Duration::from_secs(5), rt.run())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, ShutdownReason::Idle);
        let frames = captured.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].lines, vec!["a", "b", "c", "d"]);
        let markers: String = frames[0].gutter.iter().map(|r| r.marker).collect();
        assert_eq!(markers, " - +");
    }

    #[tokio::test]
    async fn one_shot_without_edits_exits_immediately() {
        let mut state = EditorState::default();
        state.reset_document("x\ny");
        let (mut rt, captured, _tx) = runtime(RunMode::OneShot, state);
        let reason = rt.run().await.unwrap();
        assert_eq!(reason, ShutdownReason::Idle);
        assert_eq!(captured.frames.lock().unwrap()[0].lines, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn watch_mode_coalesces_edits_and_stops_on_shutdown() {
        let mut state = EditorState::default();
        state.reset_document("a\nb");
        let (mut rt, captured, tx) = runtime(RunMode::Watch, state);
        for text in ["a\nb\nc", "a\nb\nc\nd", "a\nb\nc\nd\ne"] {
            tx.send(Event::Edit(EditEvent::ReplaceCurrent(text.into())))
                .await
                .unwrap();
        }
        let driver = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = tx.send(Event::Shutdown).await;
        });
        let reason = tokio::time::timeout(Duration::from_secs(5), rt.run())
            .await
            .unwrap()
            .unwrap();
        driver.await.unwrap();
        assert_eq!(reason, ShutdownReason::ShutdownEvent);
        assert!(rt.state.notifier.started() <= 3);
        assert_eq!(rt.state.base.text(), "a\nb\nc\nd\ne");
        let frames = captured.frames.lock().unwrap();
        assert!(frames.len() >= 2, "initial frame plus at least one applied pass");
    }

    #[tokio::test]
    async fn new_command_discards_in_flight_result() {
        let mut state = EditorState::default();
        state.reset_document("a\nb");
        state.replace_current("a\nz");
        let (mut rt, _captured, tx) = runtime(RunMode::OneShot, state);
        rt.notify_change();
        tx.send(Event::Command(CommandEvent::New)).await.unwrap();
        rt.run().await.unwrap();
        assert_eq!(rt.state.base.text(), "");
        assert!(rt.state.annotations.is_empty());
        assert!(!rt.state.notifier.in_flight());
    }

    #[tokio::test]
    async fn quit_command_breaks_loop() {
        let (mut rt, _captured, tx) = runtime(RunMode::Watch, EditorState::default());
        tx.send(Event::Command(CommandEvent::Quit)).await.unwrap();
        assert_eq!(rt.run().await.unwrap(), ShutdownReason::CommandQuit);
    }

    #[test]
    fn shutdown_reason_labels_are_stable() {
        assert_eq!(ShutdownReason::Idle.as_str(), "idle");
        assert_eq!(ShutdownReason::CommandQuit.as_str(), "command_quit");
        assert_eq!(ShutdownReason::ShutdownEvent.as_str(), "shutdown_event");
        assert_eq!(ShutdownReason::ChannelClosed.as_str(), "channel_closed");
    }
}
