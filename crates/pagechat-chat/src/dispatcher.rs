//! Background dispatcher: content in, `{success, message | error}` out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use pagechat_core::{DispatchPolicy, Error, OverlapPolicy, Result};

use crate::actions::{compose_question, QuickAction};
use crate::client::ChatClient;
use crate::config::SettingsStore;
use crate::types::{ChatRequest, ChatResponse};

pub const EMPTY_CONTENT: &str = "Please enter some text to process.";
pub const BUSY: &str = "A request is already in progress.";

/// Sends content to the configured endpoint, one request per call.
///
/// Settings are read fresh on every call.
pub struct Dispatcher {
    settings: Arc<SettingsStore>,
    http: Client,
    policy: DispatchPolicy,
    busy: AtomicBool,
    queue: Mutex<()>,
}

/// Held for the duration of one request under the overlap policy.
#[allow(dead_code)]
enum Permit<'a> {
    Shared,
    Exclusive(BusyGuard<'a>),
    Queued(MutexGuard<'a, ()>),
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    pub fn new(settings: Arc<SettingsStore>, policy: DispatchPolicy) -> Self {
        Self {
            settings,
            http: Client::new(),
            policy,
            busy: AtomicBool::new(false),
            queue: Mutex::new(()),
        }
    }

    /// Dispatch and fold every failure into the response.
    pub async fn dispatch(&self, content: &str) -> ChatResponse {
        self.try_dispatch(content).await.into()
    }

    /// Run a quick action over page content.
    pub async fn quick_action(&self, action: QuickAction, content: &str) -> ChatResponse {
        if content.trim().is_empty() {
            return ChatResponse::failed(EMPTY_CONTENT);
        }
        self.dispatch(&action.compose(content)).await
    }

    /// Ask a free-form question about page content.
    pub async fn ask(&self, content: &str, question: &str) -> ChatResponse {
        if question.trim().is_empty() {
            return ChatResponse::failed(EMPTY_CONTENT);
        }
        self.dispatch(&compose_question(content, question)).await
    }

    /// Validate, then perform exactly one completion request.
    pub async fn try_dispatch(&self, content: &str) -> Result<String> {
        let settings = self.settings.snapshot();
        let endpoint = settings.endpoint()?;
        if content.trim().is_empty() {
            return Err(Error::Validation(EMPTY_CONTENT.into()));
        }

        let _permit = self.acquire().await?;

        let client = ChatClient::with_http(self.http.clone(), endpoint);
        let request = ChatRequest::single(&settings.model_name, content, settings.max_tokens);

        let start = Instant::now();
        let reply = tokio::time::timeout(self.policy.request_timeout, client.complete(&request))
            .await
            .map_err(|_| {
                warn!("Completion timed out after {:?}", self.policy.request_timeout);
                Error::Timeout(self.policy.request_timeout)
            })??;

        info!(
            "Completion from {} ({} chars) in {}ms",
            settings.model_name,
            reply.len(),
            start.elapsed().as_millis()
        );
        Ok(reply)
    }

    async fn acquire(&self) -> Result<Permit<'_>> {
        match self.policy.overlap {
            OverlapPolicy::Allow => Ok(Permit::Shared),
            OverlapPolicy::Reject => {
                if self
                    .busy
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    return Err(Error::Busy(BUSY.into()));
                }
                Ok(Permit::Exclusive(BusyGuard(&self.busy)))
            }
            OverlapPolicy::Serialize => Ok(Permit::Queued(self.queue.lock().await)),
        }
    }
}
