//! Chat-completion API client.
//!
//! Exactly one HTTP call per completion: no retries, no streaming. Timeouts
//! are applied by the caller.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use pagechat_core::{Error, Result};

use crate::config::Endpoint;
use crate::types::ChatRequest;

pub const GATEWAY_API_VERSION: &str = "2021-06-01-preview";

pub const GENERIC_FAILURE: &str = "API request failed";
pub const INVALID_RESPONSE: &str =
    "Invalid response from API. Please check your settings and try again.";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Client bound to one resolved endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: Endpoint,
}

impl ChatClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_http(Client::new(), endpoint)
    }

    /// Reuse an existing connection pool.
    pub fn with_http(http: Client, endpoint: Endpoint) -> Self {
        Self { http, endpoint }
    }

    /// Full completion URL for a model.
    pub fn completions_url(&self, model: &str) -> String {
        match &self.endpoint {
            Endpoint::Standard { base_url, .. } => {
                format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
            }
            Endpoint::Gateway { base_url, .. } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base_url.trim_end_matches('/'),
                model,
                GATEWAY_API_VERSION
            ),
        }
    }

    /// Send one completion request and return the trimmed reply text.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = self.completions_url(&request.model);
        debug!("POST {} with model {}", url, request.model);

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.endpoint.token().unwrap_or_default()),
            )
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!("API error {}: {}", status, message);
            return Err(Error::Api(message));
        }

        parse_completion(&body)
    }
}

/// Human-readable message from an error body, or the generic fallback.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

/// Pull `choices[0].message.content` out of a success body.
fn parse_completion(body: &str) -> Result<String> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("{} ({})", INVALID_RESPONSE, e)))?;

    let message = &parsed["choices"][0]["message"];
    if !message.is_object() {
        return Err(Error::MalformedResponse(INVALID_RESPONSE.into()));
    }
    message["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or_else(|| Error::MalformedResponse(INVALID_RESPONSE.into()))
}
