//! The shared clipboard value and where its updates go.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Receives every accepted clipboard value.
///
/// Called from [`ClipboardStore::set`] while the write lock is held, so sinks
/// see updates in the order they were stored. Implementations must not block
/// for long.
pub trait ClipboardSink: Send + Sync {
    fn publish(&self, text: &str);
}

/// Records updates in the log and nothing else.
#[derive(Debug, Default)]
pub struct LogSink;

impl ClipboardSink for LogSink {
    fn publish(&self, text: &str) {
        info!("Clipboard updated ({} chars)", text.chars().count());
    }
}

/// Forwards updates to a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ClipboardSink for ChannelSink {
    fn publish(&self, text: &str) {
        if self.tx.send(text.to_string()).is_err() {
            debug!("Clipboard receiver dropped, update not forwarded");
        }
    }
}

/// Pipes each update into a host command such as `wl-copy` or `pbcopy`.
///
/// Commands run one at a time on a dedicated worker thread, in publish order.
#[derive(Debug, Clone)]
pub struct CommandSink {
    tx: mpsc::UnboundedSender<String>,
}

impl CommandSink {
    /// Returns `None` for an empty argv or if the worker cannot be started.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let spawned = std::thread::Builder::new()
            .name("clipboard-command".to_string())
            .spawn(move || {
                while let Some(text) = rx.blocking_recv() {
                    if let Err(err) = CommandSink::run(&argv, &text) {
                        warn!("Clipboard command failed: {}", err);
                    }
                }
            });

        match spawned {
            Ok(_) => Some(Self { tx }),
            Err(err) => {
                warn!("Cannot start clipboard command worker: {}", err);
                None
            }
        }
    }

    fn run(argv: &[String], text: &str) -> std::io::Result<()> {
        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(std::io::Error::other(format!(
                "{} exited with {}",
                argv[0], status
            )));
        }
        Ok(())
    }
}

impl ClipboardSink for CommandSink {
    fn publish(&self, text: &str) {
        if self.tx.send(text.to_string()).is_err() {
            warn!("Clipboard command worker is gone, update not applied");
        }
    }
}

/// A single last-write-wins string shared by every connection.
pub struct ClipboardStore {
    value: RwLock<String>,
    sink: Arc<dyn ClipboardSink>,
}

impl ClipboardStore {
    pub fn new(sink: Arc<dyn ClipboardSink>) -> Self {
        Self {
            value: RwLock::new(String::new()),
            sink,
        }
    }

    pub fn get(&self) -> String {
        match self.value.read() {
            Ok(value) => value.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the value and notify the sink before releasing the lock.
    pub fn set(&self, text: String) {
        let mut value = match self.value.write() {
            Ok(value) => value,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.sink.publish(&text);
        *value = text;
    }
}

impl Default for ClipboardStore {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl std::fmt::Debug for ClipboardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardStore")
            .field("value", &self.get())
            .finish_non_exhaustive()
    }
}
