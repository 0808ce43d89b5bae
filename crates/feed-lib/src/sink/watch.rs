//! Change notifications for sink consumers
//!
//! Watches the sink's directory for filesystem events (the writer renames a
//! temp file over the sink, so the file itself is replaced, not modified) and
//! re-reads the table. A periodic poll covers missed events. Subscribers only
//! see a new value when the table actually changed.

use super::{SinkReader, SinkTable};
use crate::error::Result;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Configuration for the sink watcher
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Fallback re-read interval when no filesystem event arrives
    pub poll_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Publishes the current table of one sink whenever it changes
pub struct SinkWatcher {
    reader: SinkReader,
    config: WatchConfig,
}

impl SinkWatcher {
    pub fn new(reader: SinkReader, config: WatchConfig) -> Self {
        Self { reader, config }
    }

    /// Start watching; stops when the returned handle is dropped
    pub fn start(self) -> Result<SinkWatchHandle> {
        let initial = self.reader.read().unwrap_or_else(|e| {
            warn!(error = %e, "Initial sink read failed, starting from empty table");
            SinkTable::empty(self.reader.schema())
        });
        let (table_tx, table_rx) = watch::channel(initial);

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let sink_name: Option<OsString> = self.reader.path().file_name().map(|n| n.to_os_string());
        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let touches_sink = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == sink_name);
                    if touches_sink {
                        let _ = event_tx.send(());
                    }
                }
            },
            notify::Config::default(),
        )?;

        let watch_dir = watch_dir(&self.reader);
        std::fs::create_dir_all(&watch_dir).map_err(notify::Error::io)?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        info!(path = %self.reader.path().display(), "Watching sink");

        let reader = self.reader;
        let poll_interval = self.config.poll_interval;
        let task = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                tokio::select! {
                    event = event_rx.recv() => {
                        if event.is_none() {
                            debug!("Sink watcher channel closed");
                            break;
                        }
                    }
                    _ = ticker.tick() => {}
                }

                if table_tx.is_closed() {
                    break;
                }

                match reader.read() {
                    Ok(table) => {
                        table_tx.send_if_modified(|current| {
                            if *current != table {
                                *current = table;
                                true
                            } else {
                                false
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Failed to re-read sink"),
                }
            }
        });

        Ok(SinkWatchHandle {
            _watcher: watcher,
            task,
            table_rx,
        })
    }
}

fn watch_dir(reader: &SinkReader) -> PathBuf {
    match reader.path().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Handle to a running sink watcher
pub struct SinkWatchHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    table_rx: watch::Receiver<SinkTable>,
}

impl SinkWatchHandle {
    /// A receiver that yields each new table
    pub fn subscribe(&self) -> watch::Receiver<SinkTable> {
        self.table_rx.clone()
    }

    /// The most recently published table
    pub fn current(&self) -> SinkTable {
        self.table_rx.borrow().clone()
    }
}

impl Drop for SinkWatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
