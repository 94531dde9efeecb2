//! Rate-limited request queue
//!
//! Serialises GET requests against one origin: a single processing task,
//! a minimum gap between request starts, exponential backoff on HTTP 429
//! and linear backoff on other failures. Retried requests go back to the
//! front of the queue, everything else is FIFO.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::models::config::RetryPolicy;
use crate::models::errors::{AppError, AppResult, ErrorCode};

/// A queued GET request
#[derive(Debug)]
pub struct QueueRequest {
    pub url: String,
    pub name: String,
    /// Delay applied before the last retry
    pub delay: Duration,
    pub retries: u32,
    initial_delay: Duration,
    responder: oneshot::Sender<AppResult<Value>>,
}

impl QueueRequest {
    fn resolve(self, result: AppResult<Value>) {
        // Caller may have gone away; nothing left to do then
        let _ = self.responder.send(result);
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueueRequest>,
    is_processing: bool,
    last_request_time: Option<Instant>,
}

struct QueueInner {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    state: Mutex<QueueState>,
}

/// Handle to a shared queue. Clones share the same queue and timing state.
#[derive(Clone)]
pub struct RateLimitedQueue {
    inner: Arc<QueueInner>,
}

/// What to do with a request after one attempt
enum Attempt {
    Done(Value),
    RateLimited,
    Failed(AppError),
}

impl RateLimitedQueue {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                transport,
                policy,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.inner.policy
    }

    /// Number of requests waiting (not counting the one in flight)
    pub fn len(&self) -> usize {
        self.state().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_processing(&self) -> bool {
        self.state().is_processing
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a GET and wait for its parsed JSON body.
    ///
    /// `initial_delay` is the base of the exponential 429 backoff for this request.
    pub async fn enqueue(
        &self,
        url: impl Into<String>,
        name: impl Into<String>,
        initial_delay: Duration,
    ) -> AppResult<Value> {
        let (responder, receiver) = oneshot::channel();
        let request = QueueRequest {
            url: url.into(),
            name: name.into(),
            delay: initial_delay,
            retries: 0,
            initial_delay,
            responder,
        };

        let start_processing = {
            let mut state = self.state();
            info!(
                "📥 Queued {} (queue length: {})",
                request.name,
                state.pending.len() + 1
            );
            state.pending.push_back(request);
            if state.is_processing {
                false
            } else {
                state.is_processing = true;
                true
            }
        };

        if start_processing {
            let queue = self.clone();
            tokio::spawn(async move { queue.process().await });
        }

        receiver
            .await
            .map_err(|_| AppError::internal("Request queue stopped before answering"))?
    }

    /// Drain the queue. Only one instance runs at a time (guarded by `is_processing`).
    async fn process(&self) {
        loop {
            let (request, wait) = {
                let mut state = self.state();
                match state.pending.pop_front() {
                    Some(request) => {
                        let since_last = state.last_request_time.map(|t| t.elapsed());
                        (request, self.inner.policy.spacing_wait(since_last))
                    }
                    None => {
                        state.is_processing = false;
                        debug!("📭 Queue drained");
                        return;
                    }
                }
            };

            if !wait.is_zero() {
                info!("⏳ Waiting {}ms before {}", wait.as_millis(), request.name);
                sleep(wait).await;
            }

            self.state().last_request_time = Some(Instant::now());
            info!("🚀 Requesting {} (attempt {})", request.name, request.retries + 1);

            let outcome = self
                .inner
                .transport
                .execute(HttpRequest::get(&request.url))
                .await;

            match Self::classify(outcome) {
                Attempt::Done(value) => {
                    info!("✅ {} completed", request.name);
                    request.resolve(Ok(value));
                }
                Attempt::RateLimited => self.handle_rate_limited(request).await,
                Attempt::Failed(error) => self.handle_failure(request, error).await,
            }
        }
    }

    fn classify(outcome: AppResult<HttpResponse>) -> Attempt {
        match outcome {
            Ok(response) if response.is_rate_limited() => Attempt::RateLimited,
            Ok(response) if response.is_success() => match response.json::<Value>() {
                Ok(value) => Attempt::Done(value),
                Err(e) => Attempt::Failed(e),
            },
            Ok(response) => Attempt::Failed(AppError::upstream(
                response.status,
                response.error_message(),
            )),
            Err(e) => Attempt::Failed(e),
        }
    }

    async fn handle_rate_limited(&self, mut request: QueueRequest) {
        let policy = self.inner.policy;
        request.retries += 1;

        if request.retries > policy.max_retries {
            warn!(
                "❌ {} rate limited {} times, giving up",
                request.name, request.retries
            );
            let error = AppError::rate_limit_exceeded(&request.name, request.retries);
            request.resolve(Err(error));
            return;
        }

        let delay = policy.rate_limit_backoff(request.initial_delay, request.retries);
        request.delay = delay;
        warn!(
            "🔁 Rate limited (HTTP 429) on {} - retry {}/{} in {}ms",
            request.name,
            request.retries,
            policy.max_retries,
            delay.as_millis()
        );
        self.state().pending.push_front(request);
        sleep(delay).await;
    }

    async fn handle_failure(&self, mut request: QueueRequest, error: AppError) {
        let policy = self.inner.policy;

        if error.code == ErrorCode::RateLimitExceeded || !error.code.is_retryable() {
            warn!("❌ {} failed: {}", request.name, error);
            request.resolve(Err(error));
            return;
        }

        request.retries += 1;
        if request.retries >= policy.max_retries {
            warn!(
                "❌ {} failed after {} attempts: {}",
                request.name, request.retries, error
            );
            request.resolve(Err(error));
            return;
        }

        let delay = policy.linear_backoff(request.retries);
        request.delay = delay;
        warn!(
            "⚠️ {} failed: {} - retry {}/{} in {}ms",
            request.name,
            error,
            request.retries,
            policy.max_retries,
            delay.as_millis()
        );
        self.state().pending.push_front(request);
        sleep(delay).await;
    }
}
