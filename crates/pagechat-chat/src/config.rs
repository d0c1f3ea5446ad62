//! Extension settings persistence and endpoint resolution.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use pagechat_core::{Error, Result};

use crate::types::{EndpointMode, SettingsChange, SettingsUpdate, SettingsView, Theme, ValueChange};

pub const DEFAULT_MODEL: &str = "meta-llama/Llama-2-7b-chat";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const MAX_TOKENS_CEILING: u32 = 2048;

pub const MISSING_ENDPOINT: &str =
    "API URL is not configured. Please open settings and configure the API URL.";

const CHANGE_CHANNEL_CAPACITY: usize = 16;
const REDACTED: &str = "********";

/// Where and how to reach the chat-completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `{base_url}/v1/chat/completions`
    Standard { base_url: String, token: Option<String> },
    /// `{base_url}/openai/deployments/{model}/chat/completions?api-version=...`
    Gateway { base_url: String, token: Option<String> },
}

impl Endpoint {
    pub fn mode(&self) -> EndpointMode {
        match self {
            Endpoint::Standard { .. } => EndpointMode::Standard,
            Endpoint::Gateway { .. } => EndpointMode::Gateway,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Endpoint::Standard { token, .. } | Endpoint::Gateway { token, .. } => token.as_deref(),
        }
    }
}

/// Stored extension settings (persisted to settings.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, rename = "apiUrl")]
    pub api_url: Option<String>,
    #[serde(default, rename = "apiToken")]
    pub api_token: Option<String>,
    #[serde(default, rename = "azureApiUrl")]
    pub azure_api_url: Option<String>,
    #[serde(default, rename = "azureApiToken")]
    pub azure_api_token: Option<String>,
    #[serde(default = "default_model", rename = "modelName")]
    pub model_name: String,
    #[serde(default = "default_max_tokens", rename = "maxTokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub theme: Theme,
    /// Path to settings file for saving.
    #[serde(skip)]
    pub settings_path: PathBuf,
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            azure_api_url: None,
            azure_api_token: None,
            model_name: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            theme: Theme::Light,
            settings_path: PathBuf::new(),
        }
    }
}

impl Settings {
    /// Load settings from file, falling back to env vars and defaults.
    pub fn load(settings_path: &Path) -> Self {
        let mut settings: Settings = std::fs::read_to_string(settings_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        settings.settings_path = settings_path.to_path_buf();

        if non_empty(&settings.api_url).is_none() {
            settings.api_url = std::env::var("PAGECHAT_API_URL").ok();
        }
        if non_empty(&settings.api_token).is_none() {
            settings.api_token = std::env::var("PAGECHAT_API_TOKEN").ok();
        }
        if settings.max_tokens == 0 || settings.max_tokens > MAX_TOKENS_CEILING {
            settings.max_tokens = DEFAULT_MAX_TOKENS;
        }

        settings
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.settings_path, json)?;
        info!("Saved settings to {}", self.settings_path.display());
        Ok(())
    }

    /// Apply an update, merging with existing settings.
    ///
    /// Validation happens before anything is changed.
    pub fn apply_update(&mut self, update: &SettingsUpdate) -> Result<()> {
        let max_tokens = match update.max_tokens {
            Some(n) if !(1..=MAX_TOKENS_CEILING as i64).contains(&n) => {
                return Err(Error::Validation(format!(
                    "Max tokens must be between 1 and {}",
                    MAX_TOKENS_CEILING
                )));
            }
            Some(n) => Some(n as u32),
            None => None,
        };

        if let Some(v) = &update.api_url {
            self.api_url = cleared(v);
        }
        if let Some(v) = &update.api_token {
            self.api_token = cleared(v);
        }
        if let Some(v) = &update.azure_api_url {
            self.azure_api_url = cleared(v);
        }
        if let Some(v) = &update.azure_api_token {
            self.azure_api_token = cleared(v);
        }
        if let Some(m) = &update.model_name {
            self.model_name = cleared(m).unwrap_or_else(default_model);
        }
        if let Some(n) = max_tokens {
            self.max_tokens = n;
        }
        if let Some(t) = update.theme {
            self.theme = t;
        }
        Ok(())
    }

    /// Resolve which endpoint to call. The gateway wins when configured.
    pub fn endpoint(&self) -> Result<Endpoint> {
        if let Some(base) = non_empty(&self.azure_api_url) {
            let token = non_empty(&self.azure_api_token).or_else(|| non_empty(&self.api_token));
            return Ok(Endpoint::Gateway {
                base_url: base.to_string(),
                token: token.map(str::to_string),
            });
        }
        if let Some(base) = non_empty(&self.api_url) {
            return Ok(Endpoint::Standard {
                base_url: base.to_string(),
                token: non_empty(&self.api_token).map(str::to_string),
            });
        }
        Err(Error::Config(MISSING_ENDPOINT.into()))
    }

    /// Build the public settings response (no tokens exposed).
    pub fn to_view(&self) -> SettingsView {
        SettingsView {
            api_url: self.api_url.clone(),
            api_token_configured: non_empty(&self.api_token).is_some(),
            azure_api_url: self.azure_api_url.clone(),
            azure_api_token_configured: non_empty(&self.azure_api_token).is_some(),
            model_name: self.model_name.clone(),
            max_tokens: self.max_tokens,
            theme: self.theme,
            mode: self.endpoint().ok().map(|e| e.mode()),
        }
    }

    /// Per-key differences between two settings, tokens redacted.
    pub fn diff(&self, newer: &Settings) -> SettingsChange {
        let (old, new) = match (serde_json::to_value(self), serde_json::to_value(newer)) {
            (Ok(serde_json::Value::Object(old)), Ok(serde_json::Value::Object(new))) => (old, new),
            _ => return SettingsChange::default(),
        };

        let mut change = SettingsChange::default();
        for (key, new_value) in new {
            let old_value = old.get(&key).cloned().unwrap_or(serde_json::Value::Null);
            if old_value == new_value {
                continue;
            }
            let entry = if key.ends_with("Token") {
                ValueChange {
                    old_value: redact(&old_value),
                    new_value: redact(&new_value),
                }
            } else {
                ValueChange {
                    old_value,
                    new_value,
                }
            };
            change.changes.insert(key, entry);
        }
        change
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn cleared(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn redact(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Null => serde_json::Value::Null,
        _ => serde_json::Value::String(REDACTED.into()),
    }
}

/// Shared settings with change notification.
///
/// Readers take a fresh snapshot per operation; nothing caches settings.
pub struct SettingsStore {
    settings: RwLock<Settings>,
    changes: broadcast::Sender<SettingsChange>,
    /// Serializes writers so saves land in update order.
    writer: Mutex<()>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            settings: RwLock::new(settings),
            changes,
            writer: Mutex::new(()),
        }
    }

    /// Load the store from a settings file.
    pub fn open(settings_path: &Path) -> Self {
        Self::new(Settings::load(settings_path))
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Validate, apply and persist an update, then notify subscribers.
    ///
    /// The file write runs on the blocking pool with no lock held; readers keep
    /// seeing the previous settings until it succeeds.
    pub async fn update(&self, update: &SettingsUpdate) -> Result<Settings> {
        let _writer = self.writer.lock().await;

        let mut next = self.snapshot();
        next.apply_update(update)?;

        let persisted = next.clone();
        tokio::task::spawn_blocking(move || persisted.save())
            .await
            .map_err(|e| Error::Internal(format!("settings save task failed: {}", e)))??;

        let change = {
            let mut current = self.settings.write();
            let change = current.diff(&next);
            *current = next.clone();
            change
        };
        let updated = next;

        if !change.is_empty() {
            let keys: Vec<&str> = change.changes.keys().map(String::as_str).collect();
            debug!("Settings changed: {}", keys.join(", "));
            // No subscribers is fine.
            let _ = self.changes.send(change);
        }
        Ok(updated)
    }

    /// Receive a `SettingsChange` after every effective update.
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &tempfile::TempDir) -> Settings {
        Settings {
            settings_path: dir.path().join("settings.json"),
            ..Settings::default()
        }
    }

    #[test]
    fn test_missing_endpoint_is_config_error() {
        let settings = Settings::default();
        match settings.endpoint() {
            Err(Error::Config(msg)) => assert_eq!(msg, MISSING_ENDPOINT),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_urls_count_as_missing() {
        let settings = Settings {
            api_url: Some("   ".into()),
            azure_api_url: Some("".into()),
            ..Settings::default()
        };
        assert!(settings.endpoint().is_err());
    }

    #[test]
    fn test_gateway_wins_and_falls_back_to_plain_token() {
        let settings = Settings {
            api_url: Some("http://plain".into()),
            api_token: Some("plain-token".into()),
            azure_api_url: Some("https://gw.example.com".into()),
            ..Settings::default()
        };
        assert_eq!(
            settings.endpoint().unwrap(),
            Endpoint::Gateway {
                base_url: "https://gw.example.com".into(),
                token: Some("plain-token".into()),
            }
        );
    }

    #[test]
    fn test_standard_endpoint() {
        let settings = Settings {
            api_url: Some("http://localhost:8000".into()),
            ..Settings::default()
        };
        let endpoint = settings.endpoint().unwrap();
        assert_eq!(endpoint.mode(), EndpointMode::Standard);
        assert_eq!(endpoint.token(), None);
    }

    #[test]
    fn test_apply_update_rejects_out_of_range_tokens() {
        let mut settings = Settings::default();
        for bad in [0, -3, 2049] {
            let update = SettingsUpdate {
                max_tokens: Some(bad),
                model_name: Some("other".into()),
                ..SettingsUpdate::default()
            };
            assert!(matches!(settings.apply_update(&update), Err(Error::Validation(_))));
        }
        assert_eq!(settings.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(settings.model_name, DEFAULT_MODEL);
    }

    #[test]
    fn test_apply_update_trims_and_clears() {
        let mut settings = Settings {
            api_token: Some("old".into()),
            ..Settings::default()
        };
        let update = SettingsUpdate {
            api_url: Some("  http://x  ".into()),
            api_token: Some("".into()),
            max_tokens: Some(2048),
            theme: Some(Theme::Dark),
            ..SettingsUpdate::default()
        };
        settings.apply_update(&update).unwrap();
        assert_eq!(settings.api_url.as_deref(), Some("http://x"));
        assert_eq!(settings.api_token, None);
        assert_eq!(settings.max_tokens, 2048);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn test_view_masks_tokens() {
        let settings = Settings {
            api_url: Some("http://x".into()),
            api_token: Some("secret".into()),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings.to_view()).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"apiTokenConfigured\":true"));
        assert!(json.contains("\"mode\":\"standard\""));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(&dir);
        settings.api_url = Some("http://saved".into());
        settings.max_tokens = 42;
        settings.save().unwrap();

        let loaded = Settings::load(&dir.path().join("settings.json"));
        assert_eq!(loaded.api_url.as_deref(), Some("http://saved"));
        assert_eq!(loaded.max_tokens, 42);
        assert_eq!(loaded.model_name, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_uses_defaults_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load(&dir.path().join("nope.json"));
        assert_eq!(loaded.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(loaded.theme, Theme::Light);
    }

    #[tokio::test]
    async fn test_store_update_broadcasts_redacted_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(settings_in(&dir));
        let mut rx = store.subscribe();

        let update = SettingsUpdate {
            api_url: Some("http://new".into()),
            api_token: Some("hunter2".into()),
            ..SettingsUpdate::default()
        };
        store.update(&update).await.unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.changes["apiUrl"].new_value, serde_json::json!("http://new"));
        assert_eq!(change.changes["apiToken"].old_value, serde_json::Value::Null);
        assert_eq!(change.changes["apiToken"].new_value, serde_json::json!(REDACTED));
        assert!(!change.changes.contains_key("modelName"));
        assert_eq!(store.snapshot().api_url.as_deref(), Some("http://new"));
        assert!(dir.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_persist_last_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(SettingsStore::new(settings_in(&dir)));

        let mut handles = Vec::new();
        for tokens in 1..=8u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let update = SettingsUpdate {
                    max_tokens: Some(tokens as i64 * 100),
                    ..SettingsUpdate::default()
                };
                store.update(&update).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let on_disk = Settings::load(&dir.path().join("settings.json"));
        assert_eq!(on_disk.max_tokens, store.snapshot().max_tokens);
    }

    #[tokio::test]
    async fn test_store_rejects_invalid_update_without_changing_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(settings_in(&dir));
        let update = SettingsUpdate {
            max_tokens: Some(5000),
            ..SettingsUpdate::default()
        };
        assert!(store.update(&update).await.is_err());
        assert_eq!(store.snapshot().max_tokens, DEFAULT_MAX_TOKENS);
        assert!(!dir.path().join("settings.json").exists());
    }
}
