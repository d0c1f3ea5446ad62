//! Relay types: matching the content script's payloads.

use serde::{Deserialize, Serialize};

use pagechat_extract::PageSnapshot;

/// Page report pushed by the content script.
#[derive(Debug, Clone, Deserialize)]
pub struct PageReport {
    #[serde(rename = "tabId")]
    pub tab_id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snapshot: PageSnapshot,
}

/// Latest known state of one tab.
#[derive(Debug, Clone)]
pub struct TrackedPage {
    pub tab_id: String,
    pub url: String,
    pub title: Option<String>,
    pub snapshot: PageSnapshot,
    pub reported_at: String,
}

/// Tab listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct TabSummary {
    #[serde(rename = "tabId")]
    pub tab_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "hasSelection")]
    pub has_selection: bool,
    pub active: bool,
    #[serde(rename = "reportedAt")]
    pub reported_at: String,
}

/// Content response sent back to the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub content: String,
}
