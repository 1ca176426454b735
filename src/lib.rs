//! Local-network file sharing over HTTP.
//!
//! One host publishes a directory to browsers on the same network. Peers can
//! download, upload and delete files, and share a small text clipboard with
//! the host. The crate can run as the `lanshare` binary or be embedded by
//! building an [`AppState`] and driving a [`ShareServer`].

pub mod clipboard;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod mime;
pub mod netaddr;
pub mod page;
pub mod repository;
pub mod routes;
pub mod server;
pub mod validate;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use clipboard::{ClipboardSink, ClipboardStore};
pub use config::Config;
pub use error::ShareError;
pub use repository::{FileEntry, FileRepository};
pub use server::ShareServer;

/// Server context handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// The shared directory
    pub repository: Arc<FileRepository>,
    /// The shared clipboard value
    pub clipboard: Arc<ClipboardStore>,
    /// Configuration
    pub config: Arc<Config>,
    running: Arc<AtomicBool>,
}

impl AppState {
    /// Create a new AppState with the default config and a logging clipboard sink.
    pub fn new(root_dir: PathBuf) -> Self {
        Self::with_config(root_dir, Config::default(), ClipboardStore::default())
    }

    /// Create a new AppState with the given config and clipboard store.
    pub fn with_config(root_dir: PathBuf, config: Config, clipboard: ClipboardStore) -> Self {
        let staging = config.staging_dir_for(&root_dir);
        let repository = FileRepository::new(root_dir, staging);
        Self {
            repository: Arc::new(repository),
            clipboard: Arc::new(clipboard),
            config: Arc::new(config),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}
