//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pagechat_chat::{Dispatcher, Settings, SettingsStore};
use pagechat_core::PageChatConfig;
use pagechat_relay::{PageRelay, PanelSession};
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

/// A panel session and when the panel last read it.
pub struct OpenPanel {
    pub session: PanelSession,
    pub last_seen: Instant,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: PageChatConfig,
    pub settings: Arc<SettingsStore>,
    pub dispatcher: Dispatcher,
    pub relay: Arc<PageRelay>,
    pub sessions: RwLock<HashMap<String, OpenPanel>>,
}

impl AppState {
    pub fn new(config: PageChatConfig) -> Self {
        let settings = Settings::load(&config.data_paths.settings_file);
        Self::with_settings(config, settings)
    }

    pub fn with_settings(config: PageChatConfig, settings: Settings) -> Self {
        let settings = Arc::new(SettingsStore::new(settings));
        let dispatcher = Dispatcher::new(settings.clone(), config.dispatch);

        Self {
            config,
            settings,
            dispatcher,
            relay: Arc::new(PageRelay::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Track a new panel session, returning its id.
    pub fn insert_panel(&self, session: PanelSession) -> String {
        let id = session.id().to_string();
        self.sessions.write().insert(
            id.clone(),
            OpenPanel {
                session,
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Current content of a panel session, marking it as seen.
    pub fn read_panel(&self, id: &str) -> Option<String> {
        let mut sessions = self.sessions.write();
        let panel = sessions.get_mut(id)?;
        panel.last_seen = Instant::now();
        Some(panel.session.content())
    }

    pub fn close_panel(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id);
        match removed {
            Some(panel) => {
                panel.session.close();
                true
            }
            None => false,
        }
    }

    /// Close every session not read within `idle`. Returns how many closed.
    pub fn expire_idle_panels(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<OpenPanel> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, p)| now.duration_since(p.last_seen) >= idle)
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for panel in &expired {
            debug!("Closing idle panel session {}", panel.session.id());
        }
        let count = expired.len();
        for panel in expired {
            panel.session.close();
        }
        count
    }
}

/// Start the task that closes panel sessions abandoned without a DELETE.
pub fn start_panel_sweeper(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let idle = state.config.panel_idle_timeout;
    let period = (idle / 2).max(Duration::from_secs(1));

    tokio::spawn(async move {
        info!("Panel sweeper started, idle timeout {:?}", idle);
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let closed = state.expire_idle_panels(idle);
            if closed > 0 {
                info!("Closed {} idle panel session(s)", closed);
            }
        }
    })
}
