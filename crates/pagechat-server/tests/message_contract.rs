//! Message contract tests: the JSON shapes the extension's panel, content
//! script and settings page exchange with the server.

use pagechat_chat::{ChatRequest, ChatResponse, QuickAction, Settings, SettingsUpdate};
use pagechat_extract::PageSnapshot;
use pagechat_relay::ContentResponse;
use serde_json::json;

/// `{success: true, message}` on success, `{success: false, error}` on failure,
/// never both fields at once.
#[test]
fn test_chat_response_shape() {
    let ok = serde_json::to_value(ChatResponse::ok("Summary")).unwrap();
    assert_eq!(ok["success"], json!(true));
    assert!(ok["message"].is_string());
    assert!(ok.get("error").is_none());

    let failed = serde_json::to_value(ChatResponse::failed("bad token")).unwrap();
    assert_eq!(failed["success"], json!(false));
    assert_eq!(failed["error"], json!("bad token"));
    assert!(failed.get("message").is_none());
}

/// `getContent` answers with `{content: string}`.
#[test]
fn test_content_response_shape() {
    let value = serde_json::to_value(ContentResponse {
        content: "page text".into(),
    })
    .unwrap();
    assert_eq!(value, json!({"content": "page text"}));
}

/// Outbound body is exactly `{model, messages, max_tokens}`.
#[test]
fn test_outbound_request_body() {
    let body = serde_json::to_value(ChatRequest::single("m", "Please summarize this text: x", 500)).unwrap();
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&"model"));
    assert!(keys.contains(&"messages"));
    assert!(keys.contains(&"max_tokens"));
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["role"], json!("user"));
}

/// Storage keys written by the settings page load into `Settings`.
#[test]
fn test_stored_settings_keys() {
    let settings: Settings = serde_json::from_value(json!({
        "apiUrl": "http://localhost:8000",
        "apiToken": "tok",
        "modelName": "meta-llama/Llama-3.2-1B-Instruct",
        "maxTokens": 700,
        "theme": "system"
    }))
    .unwrap();
    assert_eq!(settings.api_url.as_deref(), Some("http://localhost:8000"));
    assert_eq!(settings.max_tokens, 700);
    assert!(settings.endpoint().is_ok());

    let stored = serde_json::to_value(&settings).unwrap();
    for key in ["apiUrl", "apiToken", "azureApiUrl", "azureApiToken", "modelName", "maxTokens", "theme"] {
        assert!(stored.get(key).is_some(), "missing key {}", key);
    }
}

/// Settings updates accept partial bodies.
#[test]
fn test_partial_settings_update() {
    let update: SettingsUpdate = serde_json::from_value(json!({"theme": "dark"})).unwrap();
    assert!(update.api_url.is_none());
    assert!(update.max_tokens.is_none());
}

/// Quick action names used by the panel buttons.
#[test]
fn test_quick_action_names() {
    for name in ["proofread", "summarize", "rewrite", "makeList"] {
        let action: QuickAction = serde_json::from_value(json!(name)).unwrap();
        assert_eq!(action.name(), name);
    }
}

/// The content script's snapshot payload, with optional fields omitted.
#[test]
fn test_snapshot_payload_tolerates_missing_fields() {
    let snapshot: PageSnapshot = serde_json::from_value(json!({
        "elements": [{"textNodes": ["only text"]}]
    }))
    .unwrap();
    assert!(snapshot.selection.is_none());
    assert_eq!(pagechat_extract::extract_content(&snapshot), "only text");
}
