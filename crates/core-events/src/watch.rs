//! Polling file watcher.
//!
//! Stands in for an interactive editing surface: whenever the watched file's
//! contents change on disk the new text is delivered to the loop as an
//! [`EditEvent::ReplaceCurrent`]. Polling keeps the source portable and makes
//! a burst of saves collapse into one event per interval.

use crate::{AsyncEventSource, CHANNEL_SEND_FAILURES, EditEvent, Event};
use core_text::normalize_line_endings;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

pub struct FileWatchSource {
    path: PathBuf,
    interval: Duration,
    last_seen: Option<String>,
}

impl FileWatchSource {
    /// Watch `path`, treating `initial` (LF-normalized document text) as already delivered.
    pub fn new(path: impl Into<PathBuf>, interval: Duration, initial: Option<String>) -> Self {
        Self {
            path: path.into(),
            interval,
            last_seen: initial,
        }
    }
}

impl AsyncEventSource for FileWatchSource {
    fn name(&self) -> &'static str {
        "file_watch"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let FileWatchSource {
            path,
            interval,
            mut last_seen,
        } = *self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }
                let content = match tokio::fs::read_to_string(&path).await {
                    Ok(c) => c,
                    Err(e) => {
                        // Editors often replace files via rename; retry next tick.
                        trace!(target: "io.watch", file = %path.display(), ?e, "watch_read_failed");
                        continue;
                    }
                };
                let normalized = normalize_line_endings(&content).body().to_string();
                if last_seen.as_deref() == Some(normalized.as_str()) {
                    continue;
                }
                debug!(target: "io.watch", file = %path.display(), size_bytes = normalized.len(), "watch_change_detected");
                last_seen = Some(normalized.clone());
                if tx
                    .send(Event::Edit(EditEvent::ReplaceCurrent(normalized)))
                    .await
                    .is_err()
                {
                    CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn emits_on_change_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.txt");
        std::fs::write(&path, "a\r\nb").unwrap();
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let src = FileWatchSource::new(&path, Duration::from_millis(5), Some("a\nb".into()));
        let handle = Box::new(src).spawn(tx);

        // Same content (after normalization): nothing delivered.
        let quiet = tokio::time::timeout(Duration::from_millis(40), rx.recv()).await;
        assert!(quiet.is_err(), "unchanged file must not emit");

        std::fs::write(&path, "a\nb\nc").unwrap();
        let ev = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("change observed")
            .expect("channel open");
        match ev {
            Event::Edit(EditEvent::ReplaceCurrent(text)) => assert_eq!(text, "a\nb\nc"),
            other => panic!("unexpected event {other:?}"),
        }

        drop(rx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher exits after receiver drop")
            .unwrap();
    }
}
