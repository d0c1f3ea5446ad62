//! Configuration and data directory management.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3004;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_PANEL_IDLE_SECS: u64 = 300;

/// Paths to all PageChat data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Extension settings (`data/settings.json`).
    pub settings_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            settings_file: root.join("settings.json"),
            root,
        })
    }
}

/// What to do when a dispatch arrives while another is still outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Run every request independently, overlapping freely.
    #[default]
    Allow,
    /// Fail the newer request with a busy error.
    Reject,
    /// Queue requests and run them one at a time.
    Serialize,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            "serialize" | "queue" => Ok(Self::Serialize),
            other => Err(format!("unknown overlap policy: {}", other)),
        }
    }
}

/// Timeout and overlap rules applied to every dispatched request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DispatchPolicy {
    pub request_timeout: Duration,
    pub overlap: OverlapPolicy,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            overlap: OverlapPolicy::Allow,
        }
    }
}

/// Top-level PageChat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageChatConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Dispatcher timeout and overlap rules.
    pub dispatch: DispatchPolicy,
    /// How often an open panel re-reads page content.
    pub poll_interval: Duration,
    /// Panel sessions not read for this long are closed.
    pub panel_idle_timeout: Duration,
}

impl PageChatConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);
        let timeout_secs = env_parse("PAGECHAT_REQUEST_TIMEOUT_SECS")
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let poll_ms = env_parse("PAGECHAT_POLL_INTERVAL_MS")
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        let idle_secs = env_parse("PAGECHAT_PANEL_IDLE_SECS")
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PANEL_IDLE_SECS);

        let overlap = match std::env::var("PAGECHAT_OVERLAP") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to allow", e);
                OverlapPolicy::Allow
            }),
            Err(_) => OverlapPolicy::Allow,
        };

        Ok(Self {
            port,
            data_paths: DataPaths::new(data_dir)?,
            dispatch: DispatchPolicy {
                request_timeout: Duration::from_secs(timeout_secs),
                overlap,
            },
            poll_interval: Duration::from_millis(poll_ms),
            panel_idle_timeout: Duration::from_secs(idle_secs),
        })
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
