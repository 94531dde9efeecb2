//! Scripted in-memory transport for unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::models::errors::{AppError, AppResult};

#[derive(Clone)]
enum Scripted {
    Response(HttpResponse),
    NetworkError,
}

/// One request seen by the mock, with the (paused-clock aware) time it arrived
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: HttpRequest,
    pub at: Instant,
}

/// Routes are matched by substring against the URL, in insertion order.
/// The last scripted answer of a route is sticky.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_scripted(&self, url_fragment: &str, scripted: Scripted) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|(k, _)| k == url_fragment) {
            Some((_, queue)) => queue.push_back(scripted),
            None => routes.push((url_fragment.to_string(), VecDeque::from([scripted]))),
        }
    }

    pub fn push(&self, url_fragment: &str, status: u16, body: &str) -> &Self {
        self.push_scripted(url_fragment, Scripted::Response(HttpResponse::new(status, body)));
        self
    }

    pub fn push_json(&self, url_fragment: &str, body: serde_json::Value) -> &Self {
        self.push(url_fragment, 200, &body.to_string())
    }

    pub fn push_network_error(&self, url_fragment: &str) -> &Self {
        self.push_scripted(url_fragment, Scripted::NetworkError);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.request.url).collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            at: Instant::now(),
        });

        let scripted = {
            let mut routes = self.routes.lock().unwrap();
            routes
                .iter_mut()
                .find(|(k, _)| request.url.contains(k.as_str()))
                .and_then(|(_, queue)| {
                    if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    }
                })
        };

        match scripted {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::NetworkError) => Err(AppError::unavailable("connection refused")),
            None => Ok(HttpResponse::new(404, r#"{"error":"no route"}"#)),
        }
    }
}
