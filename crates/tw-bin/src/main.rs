//! Twinline entrypoint.
use anyhow::{Context, Result, bail};
use clap::Parser;
use core_actions::{
    OpenFileResult, ReconcileWorker, WriteFileResult, apply_open, open_file, write_file,
};
use core_config::{Config, load_from};
use core_events::{
    AsyncEventSource, EVENT_CHANNEL_CAP, Event, EventSourceRegistry, FileWatchSource,
    PASSES_COALESCED, PASSES_FAILED, PASSES_STALE, PASSES_STARTED, PROGRESS_DROPPED,
    TickEventSource,
};
use core_reconcile::{DEFAULT_LOOKAHEAD_PER_LINE, ReconcileOptions, Reconciler};
use core_render::{RuleTable, TextSink};
use core_state::{DiffStyle, EditorState, Rgb};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod runtime;

use runtime::{EditorRuntime, RunMode};

const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "twinline", version, about = "Two-buffer line reconciler")]
struct Args {
    /// Baseline file. Omit to start from an empty baseline.
    pub path: Option<PathBuf>,
    /// Edited text to reconcile against the baseline (defaults to the baseline itself).
    #[arg(long = "current")]
    pub current: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `twinline.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Keep running, re-reading the current file and redrawing after each pass.
    #[arg(long = "watch")]
    pub watch: bool,
    /// Write the current text here on exit.
    #[arg(long = "save")]
    pub save: Option<PathBuf>,
    /// Disable colors even on a terminal.
    #[arg(long = "plain")]
    pub plain: bool,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("twinline.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "twinline.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn reconcile_options(config: &Config) -> ReconcileOptions {
    ReconcileOptions {
        safety_margin: config.safety_margin(),
        lookahead_window: config.lookahead_window(),
        max_emitted: config.max_lines(),
        lookahead_per_line: config
            .lookahead_per_line()
            .unwrap_or(DEFAULT_LOOKAHEAD_PER_LINE),
    }
}

fn rule_table(config: &Config) -> RuleTable {
    let highlight = &config.file.highlight;
    let mut table = if highlight.defaults {
        RuleTable::python_defaults()
    } else {
        RuleTable::new()
    };
    for rule in &highlight.rules {
        if let Err(err) = table.push_pattern(&rule.pattern, &rule.style) {
            warn!(target: "config", %err, "highlight_rule_rejected");
        }
    }
    table
}

fn diff_style(config: &Config) -> DiffStyle {
    let mut style = DiffStyle::default();
    let colors = &config.file.colors;
    for (slot, value) in [
        (&mut style.added, &colors.added),
        (&mut style.removed, &colors.removed),
        (&mut style.gutter, &colors.gutter),
    ] {
        let Some(hex) = value else { continue };
        match Rgb::parse_hex(hex) {
            Some(rgb) => *slot = rgb,
            None => warn!(target: "config", value = hex.as_str(), "color_rejected"),
        }
    }
    style
}

/// Load the baseline and the optional current text into a fresh state.
fn load_editor_state(args: &Args, config: &Config) -> Result<EditorState> {
    let mut state = EditorState::new(config.debounce());
    state.annotations.style = diff_style(config);

    if let Some(path) = args.path.as_ref() {
        match open_file(path) {
            OpenFileResult::Success(loaded) => apply_open(&mut state, loaded),
            OpenFileResult::Error => bail!("cannot read baseline {}", path.display()),
        }
    }
    if let Some(path) = args.current.as_ref() {
        match open_file(path) {
            OpenFileResult::Success(loaded) => {
                state.replace_current(&loaded.text);
            }
            OpenFileResult::Error => bail!("cannot read current text {}", path.display()),
        }
    }
    info!(
        target: "runtime.startup",
        baseline = args.path.as_ref().map(|p| p.display().to_string()),
        current = args.current.as_ref().map(|p| p.display().to_string()),
        baseline_lines = state.original.line_count(),
        current_lines = state.current.line_count(),
        config_override = args.config.is_some(),
        "bootstrap_complete"
    );
    Ok(state)
}

/// Translates Ctrl-C into `Event::Shutdown`.
struct CtrlCSource;

impl AsyncEventSource for CtrlCSource {
    fn name(&self) -> &'static str {
        "ctrl_c"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        error!(target: "runtime", ?e, "ctrl_c_listener_failed");
                        return;
                    }
                    info!(target: "runtime", "ctrl_c_received");
                    let _ = tx.send(Event::Shutdown).await;
                }
                _ = tx.closed() => {}
            }
        })
    }
}

fn log_pass_counters() {
    info!(
        target: "runtime.shutdown",
        started = PASSES_STARTED.load(Ordering::Relaxed),
        coalesced = PASSES_COALESCED.load(Ordering::Relaxed),
        failed = PASSES_FAILED.load(Ordering::Relaxed),
        stale = PASSES_STALE.load(Ordering::Relaxed),
        progress_dropped = PROGRESS_DROPPED.load(Ordering::Relaxed),
        "pass_counters"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let config = load_from(args.config.clone()).context("loading configuration")?;
    let state = load_editor_state(&args, &config)?;

    let mode = if args.watch {
        RunMode::Watch
    } else {
        RunMode::OneShot
    };
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(TickEventSource::new(TICK_INTERVAL));
    registry.register(CtrlCSource);
    if mode == RunMode::Watch {
        let Some(watched) = args.current.clone().or_else(|| args.path.clone()) else {
            bail!("--watch needs a file to watch (PATH or --current)");
        };
        registry.register(FileWatchSource::new(
            watched,
            config.watch_interval(),
            Some(state.current.text()),
        ));
    }
    let source_handles = registry.spawn_all(&tx);

    let stdout = std::io::stdout();
    let tty = stdout.is_terminal();
    let sink = TextSink::new(stdout, tty && !args.plain).clearing(tty && mode == RunMode::Watch);
    let worker = ReconcileWorker::new(Reconciler::new(reconcile_options(&config)), tx.clone());
    let mut runtime = EditorRuntime::new(
        state,
        mode,
        worker,
        rule_table(&config),
        Box::new(sink),
        tx,
        rx,
        source_handles,
    );
    if runtime.state.dirty {
        runtime.notify_change();
    }
    let reason = runtime.run().await?;
    info!(target: "runtime", %reason, frames = runtime.frames(), "loop_exit");

    if let Some(target) = args.save.as_deref() {
        match write_file(&mut runtime.state, Some(target)) {
            WriteFileResult::Success => {}
            other => bail!("saving to {} failed: {other:?}", target.display()),
        }
    }
    log_pass_counters();
    Ok(())
}
