//! Panel session routes: open, read and close.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use pagechat_core::Error;
use pagechat_relay::{ContentResponse, ContentSource, PanelSession};

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/panel", post(open_panel))
        .route("/panel/{id}", get(panel_content).delete(close_panel))
}

#[derive(Serialize)]
struct OpenPanelResponse {
    #[serde(rename = "sessionId")]
    session_id: String,
    content: String,
}

async fn open_panel(State(state): State<Arc<AppState>>) -> Json<OpenPanelResponse> {
    state.expire_idle_panels(state.config.panel_idle_timeout);

    let source: Arc<dyn ContentSource> = state.relay.clone();
    let session = PanelSession::open(source, state.config.poll_interval);
    let content = session.content();
    let session_id = state.insert_panel(session);
    Json(OpenPanelResponse {
        session_id,
        content,
    })
}

async fn panel_content(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.read_panel(&id) {
        Some(content) => Json(ContentResponse { content }).into_response(),
        None => error_response(&Error::NotFound(format!("panel session {}", id))),
    }
}

async fn close_panel(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    if state.close_panel(&id) {
        Json(serde_json::json!({ "success": true })).into_response()
    } else {
        error_response(&Error::NotFound(format!("panel session {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::{Method, StatusCode};
    use pagechat_chat::Settings;
    use serde_json::json;

    use crate::routes::build_router;
    use crate::routes::test_support::{call, state_with};

    fn report(text: &str) -> serde_json::Value {
        json!({
            "tabId": "1",
            "url": "https://a.test",
            "snapshot": {"elements": [{"tag": "p", "textNodes": [text]}]}
        })
    }

    #[tokio::test]
    async fn test_panel_session_follows_page_changes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Settings::default());
        let app = build_router(state.clone());

        call(&app, Method::POST, "/api/page", Some(report("before"))).await;
        let (status, opened) = call(&app, Method::POST, "/api/panel", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(opened["content"], json!("before"));
        let id = opened["sessionId"].as_str().unwrap().to_string();

        call(&app, Method::POST, "/api/page", Some(report("after"))).await;
        let mut latest = json!(null);
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(25)).await;
            let (_, body) = call(&app, Method::GET, &format!("/api/panel/{}", id), None).await;
            latest = body["content"].clone();
            if latest == json!("after") {
                break;
            }
        }
        assert_eq!(latest, json!("after"));

        let (status, _) = call(&app, Method::DELETE, &format!("/api/panel/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.sessions.read().is_empty());

        let (status, _) = call(&app, Method::GET, &format!("/api/panel/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
