//! Content-script routes: page reports and tab tracking.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use pagechat_relay::{PageReport, TabSummary};

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/page", post(report_page))
        .route("/page/active", put(set_active))
        .route("/page/{tab_id}", delete(remove_page))
        .route("/pages", get(list_pages))
}

#[derive(Debug, Deserialize)]
struct ActiveTabBody {
    #[serde(rename = "tabId")]
    tab_id: String,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

async fn report_page(State(state): State<Arc<AppState>>, Json(report): Json<PageReport>) -> Response {
    match state.relay.report(report) {
        Ok(()) => Json(SuccessResponse { success: true }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn set_active(State(state): State<Arc<AppState>>, Json(body): Json<ActiveTabBody>) -> Response {
    match state.relay.set_active(&body.tab_id) {
        Ok(()) => Json(SuccessResponse { success: true }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn remove_page(State(state): State<Arc<AppState>>, Path(tab_id): Path<String>) -> Json<SuccessResponse> {
    Json(SuccessResponse {
        success: state.relay.remove(&tab_id),
    })
}

async fn list_pages(State(state): State<Arc<AppState>>) -> Json<Vec<TabSummary>> {
    Json(state.relay.tabs())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use pagechat_chat::Settings;
    use serde_json::json;

    use crate::routes::build_router;
    use crate::routes::test_support::{call, state_with};

    fn report(tab: &str, url: &str) -> serde_json::Value {
        json!({
            "tabId": tab,
            "url": url,
            "title": "Example",
            "snapshot": {"elements": [{"tag": "p", "textNodes": ["text"]}]}
        })
    }

    #[tokio::test]
    async fn test_restricted_page_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state_with(&dir, Settings::default()));
        let (status, body) =
            call(&app, Method::POST, "/api/page", Some(report("1", "chrome://newtab"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Cannot access this page's content."));
    }

    #[tokio::test]
    async fn test_tab_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state_with(&dir, Settings::default()));
        call(&app, Method::POST, "/api/page", Some(report("1", "https://a.test"))).await;
        call(&app, Method::POST, "/api/page", Some(report("2", "https://b.test"))).await;

        let (status, _) =
            call(&app, Method::PUT, "/api/page/active", Some(json!({"tabId": "2"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) =
            call(&app, Method::PUT, "/api/page/active", Some(json!({"tabId": "missing"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, tabs) = call(&app, Method::GET, "/api/pages", None).await;
        let active: Vec<_> = tabs
            .as_array()
            .unwrap()
            .iter()
            .filter(|t| t["active"] == json!(true))
            .map(|t| t["tabId"].clone())
            .collect();
        assert_eq!(active, vec![json!("2")]);

        let (_, body) = call(&app, Method::DELETE, "/api/page/2", None).await;
        assert_eq!(body, json!({"success": true}));
        let (_, tabs) = call(&app, Method::GET, "/api/pages", None).await;
        assert_eq!(tabs.as_array().unwrap().len(), 1);
    }
}
