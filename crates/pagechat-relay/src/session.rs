//! Panel session: owns the content poll for as long as the panel is open.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::relay::ContentSource;

/// An open panel. Polling starts on `open` and stops on `close` or drop.
pub struct PanelSession {
    id: String,
    content: watch::Receiver<String>,
    poller: JoinHandle<()>,
}

impl PanelSession {
    /// Fetch content once, then re-poll every `interval` on a background task.
    ///
    /// Must be called inside a tokio runtime. Failed fetches are skipped and
    /// leave the last known content in place.
    pub fn open(source: Arc<dyn ContentSource>, interval: Duration) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let initial = source.fetch_content().unwrap_or_else(|e| {
            debug!("Initial content fetch failed: {}", e);
            String::new()
        });
        let (tx, rx) = watch::channel(initial);

        let session_id = id.clone();
        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; the initial fetch covered it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match source.fetch_content() {
                    Ok(content) => {
                        tx.send_if_modified(|current| {
                            if *current == content {
                                return false;
                            }
                            *current = content;
                            true
                        });
                    }
                    Err(e) => debug!("Panel {} poll skipped: {}", session_id, e),
                }
                if tx.is_closed() {
                    break;
                }
            }
        });

        info!("Panel session {} opened", id);
        Self {
            id,
            content: rx,
            poller,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Latest known content.
    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    /// A receiver that is notified whenever the content changes.
    pub fn watch(&self) -> watch::Receiver<String> {
        self.content.clone()
    }

    /// Stop polling.
    pub fn close(self) {
        info!("Panel session {} closed", self.id);
        // Drop aborts the poller.
    }
}

impl Drop for PanelSession {
    fn drop(&mut self) {
        self.poller.abort();
    }
}
