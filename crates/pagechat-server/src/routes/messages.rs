//! Panel message routes: `getContent`, `sendToAPI` and the composed prompts.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use pagechat_chat::QuickAction;
use pagechat_relay::ContentResponse;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/message", post(handle_message))
}

/// A message from the panel, tagged by `action`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action")]
enum PanelMessage {
    #[serde(rename = "getContent")]
    GetContent {
        #[serde(default, rename = "tabId")]
        tab_id: Option<String>,
    },
    #[serde(rename = "sendToAPI")]
    SendToApi { content: String },
    #[serde(rename = "quickAction")]
    QuickAction {
        #[serde(rename = "quickAction")]
        quick_action: QuickAction,
        content: String,
    },
    #[serde(rename = "ask")]
    Ask { content: String, question: String },
}

async fn handle_message(
    State(state): State<Arc<AppState>>,
    Json(message): Json<PanelMessage>,
) -> Response {
    match message {
        PanelMessage::GetContent { tab_id } => {
            // Unreachable pages read as empty content; the panel treats that as an error.
            let content = state.relay.content(tab_id.as_deref()).unwrap_or_else(|e| {
                debug!("getContent: {}", e);
                String::new()
            });
            Json(ContentResponse { content }).into_response()
        }
        PanelMessage::SendToApi { content } => {
            Json(state.dispatcher.dispatch(&content).await).into_response()
        }
        PanelMessage::QuickAction {
            quick_action,
            content,
        } => Json(state.dispatcher.quick_action(quick_action, &content).await).into_response(),
        PanelMessage::Ask { content, question } => {
            Json(state.dispatcher.ask(&content, &question).await).into_response()
        }
    }
}
