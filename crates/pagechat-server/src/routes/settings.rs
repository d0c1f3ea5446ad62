//! Settings routes: read, update, and the `settingsUpdated` event stream.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use pagechat_chat::{SettingsChange, SettingsUpdate, SettingsView};

use crate::routes::error_response;
use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/events", get(settings_events))
}

/// Notification pushed to every open context after a settings change.
#[derive(Debug, Serialize)]
struct SettingsUpdated {
    action: &'static str,
    #[serde(flatten)]
    change: SettingsChange,
}

impl From<SettingsChange> for SettingsUpdated {
    fn from(change: SettingsChange) -> Self {
        Self {
            action: "settingsUpdated",
            change,
        }
    }
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsView> {
    Json(state.settings.snapshot().to_view())
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Response {
    match state.settings.update(&update).await {
        Ok(settings) => Json(settings.to_view()).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn settings_events(
    State(state): State<Arc<AppState>>,
) -> Sse<KeepAliveStream<SseStream>> {
    let mut rx = state.settings.subscribe();

    let stream: SseStream = Box::pin(async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    let payload = serde_json::to_string(&SettingsUpdated::from(change))
                        .unwrap_or_default();
                    yield Ok::<_, Infallible>(Event::default().data(payload));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Settings event stream lagged, {} changes skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
