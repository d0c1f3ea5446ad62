//! Chat types matching the extension's message and wire surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for `chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// A request carrying exactly one user message.
    pub fn single(model: impl Into<String>, content: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(content)],
            max_tokens,
        }
    }
}

/// Result crossing the background/panel boundary.
///
/// Serializes as `{success: true, message}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

impl From<pagechat_core::Result<String>> for ChatResponse {
    fn from(result: pagechat_core::Result<String>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// UI theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

/// Addressing mode of the resolved endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMode {
    Standard,
    Gateway,
}

/// Settings response (tokens masked).
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    #[serde(rename = "apiUrl")]
    pub api_url: Option<String>,
    #[serde(rename = "apiTokenConfigured")]
    pub api_token_configured: bool,
    #[serde(rename = "azureApiUrl")]
    pub azure_api_url: Option<String>,
    #[serde(rename = "azureApiTokenConfigured")]
    pub azure_api_token_configured: bool,
    #[serde(rename = "modelName")]
    pub model_name: String,
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
    pub theme: Theme,
    pub mode: Option<EndpointMode>,
}

/// Settings update request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, rename = "apiUrl")]
    pub api_url: Option<String>,
    #[serde(default, rename = "apiToken")]
    pub api_token: Option<String>,
    #[serde(default, rename = "azureApiUrl")]
    pub azure_api_url: Option<String>,
    #[serde(default, rename = "azureApiToken")]
    pub azure_api_token: Option<String>,
    #[serde(default, rename = "modelName")]
    pub model_name: Option<String>,
    #[serde(default, rename = "maxTokens")]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub theme: Option<Theme>,
}

/// Old and new value of one changed setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChange {
    #[serde(rename = "oldValue")]
    pub old_value: serde_json::Value,
    #[serde(rename = "newValue")]
    pub new_value: serde_json::Value,
}

/// Broadcast after settings are saved, keyed by storage key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsChange {
    pub changes: BTreeMap<String, ValueChange>,
}

impl SettingsChange {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_response_shapes() {
        assert_eq!(
            serde_json::to_value(ChatResponse::ok("X")).unwrap(),
            json!({"success": true, "message": "X"})
        );
        assert_eq!(
            serde_json::to_value(ChatResponse::failed("bad token")).unwrap(),
            json!({"success": false, "error": "bad token"})
        );
    }

    #[test]
    fn test_request_body_shape() {
        let req = ChatRequest::single("m", "hi", 500);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 500
            })
        );
    }

    #[test]
    fn test_response_from_result() {
        let failed: ChatResponse =
            Err::<String, _>(pagechat_core::Error::Validation("empty".into())).into();
        assert_eq!(failed, ChatResponse::failed("empty"));
    }
}
