//! Configuration loading and parsing.
//!
//! Parses `twinline.toml` (or an override path provided by the binary).
//! Every section is optional and unknown fields are ignored so older files
//! keep loading. A file that fails to parse falls back to defaults with a
//! warning; reconciliation never waits on configuration.
//!
//! ```toml
//! [reconcile]
//! safety_margin = 10
//! lookahead_window = 500
//! max_lines = 200000
//! lookahead_per_line = 64
//! [notifier]
//! debounce_ms = 0
//! [watch]
//! interval_ms = 250
//! [colors]
//! added = "#dae8bc"
//! [highlight]
//! defaults = true
//! [[highlight.rules]]
//! pattern = "TODO"
//! style = "comment"
//! ```

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "twinline.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    #[serde(default = "ReconcileConfig::default_safety_margin")]
    pub safety_margin: usize,
    /// Lines scanned by each rescue lookahead; absent or 0 means unbounded.
    #[serde(default)]
    pub lookahead_window: Option<usize>,
    /// Hard cap on emitted lines per pass.
    #[serde(default)]
    pub max_lines: Option<usize>,
    /// Lookahead comparisons allowed per line of the emit limit.
    #[serde(default)]
    pub lookahead_per_line: Option<usize>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            safety_margin: Self::default_safety_margin(),
            lookahead_window: None,
            max_lines: None,
            lookahead_per_line: None,
        }
    }
}

impl ReconcileConfig {
    const fn default_safety_margin() -> usize {
        10
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    #[serde(default)]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    #[serde(default = "WatchConfig::default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
        }
    }
}

impl WatchConfig {
    const fn default_interval_ms() -> u64 {
        250
    }
}

/// Hex color overrides (`#rrggbb`); absent entries keep the built-in palette.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ColorConfig {
    #[serde(default)]
    pub added: Option<String>,
    #[serde(default)]
    pub removed: Option<String>,
    #[serde(default)]
    pub gutter: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HighlightRuleConfig {
    pub pattern: String,
    pub style: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    #[serde(default = "HighlightConfig::default_defaults")]
    pub defaults: bool,
    #[serde(default)]
    pub rules: Vec<HighlightRuleConfig>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            defaults: Self::default_defaults(),
            rules: Vec::new(),
        }
    }
}

impl HighlightConfig {
    const fn default_defaults() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,       // original file string (optional)
    pub source: Option<PathBuf>,   // path the file was read from
    pub file: ConfigFile,          // parsed (or default) data
}

/// Best-effort config path: `./twinline.toml`, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("twinline").join(CONFIG_FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_absent_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), rules = file.highlight.rules.len(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                source: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Lookahead window with `0` normalized to unbounded.
    pub fn lookahead_window(&self) -> Option<usize> {
        match self.file.reconcile.lookahead_window {
            Some(0) => {
                info!(target: "config", "lookahead_window_zero_unbounded");
                None
            }
            other => other,
        }
    }

    pub fn safety_margin(&self) -> usize {
        self.file.reconcile.safety_margin
    }

    pub fn max_lines(&self) -> Option<usize> {
        self.file.reconcile.max_lines
    }

    pub fn lookahead_per_line(&self) -> Option<usize> {
        self.file.reconcile.lookahead_per_line
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.file.notifier.debounce_ms)
    }

    /// Watch poll interval, floored at 10ms.
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.file.watch.interval_ms.max(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), content).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.safety_margin(), 10);
        assert_eq!(cfg.lookahead_window(), None);
        assert_eq!(cfg.debounce(), Duration::ZERO);
        assert!(cfg.file.highlight.defaults);
        assert!(cfg.source.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let tmp = write_tmp(
            "[reconcile]\nsafety_margin = 4\nlookahead_window = 64\nmax_lines = 1000\nlookahead_per_line = 8\n\
             [notifier]\ndebounce_ms = 150\n[watch]\ninterval_ms = 500\n\
             [colors]\nadded = \"#00ff00\"\n\
             [highlight]\ndefaults = false\n[[highlight.rules]]\npattern = \"TODO\"\nstyle = \"comment\"\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.safety_margin(), 4);
        assert_eq!(cfg.lookahead_window(), Some(64));
        assert_eq!(cfg.max_lines(), Some(1000));
        assert_eq!(cfg.lookahead_per_line(), Some(8));
        assert_eq!(cfg.debounce(), Duration::from_millis(150));
        assert_eq!(cfg.watch_interval(), Duration::from_millis(500));
        assert_eq!(cfg.file.colors.added.as_deref(), Some("#00ff00"));
        assert_eq!(cfg.file.colors.removed, None);
        assert!(!cfg.file.highlight.defaults);
        assert_eq!(
            cfg.file.highlight.rules,
            vec![HighlightRuleConfig {
                pattern: "TODO".into(),
                style: "comment".into()
            }]
        );
        assert_eq!(cfg.source.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn zero_window_means_unbounded_and_interval_is_floored() {
        let tmp = write_tmp("[reconcile]\nlookahead_window = 0\n[watch]\ninterval_ms = 1\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.lookahead_window(), None);
        assert_eq!(cfg.watch_interval(), Duration::from_millis(10));
    }

    #[test]
    fn malformed_file_falls_back_and_warns() {
        let tmp = write_tmp("[reconcile]\nsafety_margin = \"lots\"\n");
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || load_from(Some(tmp.path().to_path_buf())).unwrap());

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_parse_failed"));
        assert_eq!(cfg.safety_margin(), 10);
        assert!(cfg.raw.is_none());
    }
}
