use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server tunables, loadable from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Idle time allowed between two reads of a request body (seconds)
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// How long `stop()` waits for in-flight connections (seconds)
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Refresh interval of the browser file list (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Where uploads are buffered before landing in the shared directory
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Host command that receives new clipboard text on stdin
    #[serde(default)]
    pub clipboard_command: Option<Vec<String>>,
}

const STAGING_DIR_NAME: &str = ".lanshare-staging";

fn default_read_timeout_secs() -> u64 {
    5
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            staging_dir: None,
            clipboard_command: None,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Configured staging directory, or a hidden sibling of `root`.
    ///
    /// Keeping staging on the same filesystem as `root` lets uploads land by
    /// rename instead of copy.
    pub fn staging_dir_for(&self, root: &Path) -> PathBuf {
        if let Some(dir) = &self.staging_dir {
            return dir.clone();
        }
        match root.parent() {
            Some(parent) => parent.join(STAGING_DIR_NAME),
            None => std::env::temp_dir().join(STAGING_DIR_NAME),
        }
    }
}
