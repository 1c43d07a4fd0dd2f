//! Scripted in-memory transport for driving `ApiClient` in tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use optica_core::api::{ClientBuilder, HttpRequest, HttpResponse, Transport, TransportError};
use optica_core::{ApiClient, ClientConfig};
use serde_json::Value;
use tokio::time::Instant;

pub const ORIGIN: &str = "http://shop.test";

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    /// Connection refused before any response
    NetworkError,
    /// Never answers; only the client's timeout ends the attempt
    Hang,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Reply::Status(status, body.to_string())
    }

    pub fn ok(body: Value) -> Self {
        Reply::json(200, body)
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub request: HttpRequest,
    pub at: Instant,
}

struct State {
    routes: Mutex<Vec<(String, Reply)>>,
    replies: Mutex<VecDeque<Reply>>,
    otherwise: Mutex<Reply>,
    calls: Mutex<Vec<Call>>,
}

/// Answers from a matching route, else with queued replies in order, then
/// with the `otherwise` reply (a network error unless changed).
#[derive(Clone)]
pub struct ScriptedTransport {
    state: Arc<State>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(State {
                routes: Mutex::new(Vec::new()),
                replies: Mutex::new(VecDeque::new()),
                otherwise: Mutex::new(Reply::NetworkError),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn push(&self, reply: Reply) -> &Self {
        self.state.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Always answer requests whose path (query excluded) ends with `suffix`.
    pub fn route(&self, suffix: &str, reply: Reply) -> &Self {
        self.state
            .routes
            .lock()
            .unwrap()
            .push((suffix.to_string(), reply));
        self
    }

    pub fn otherwise(&self, reply: Reply) {
        *self.state.otherwise.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }

    /// Milliseconds between consecutive calls.
    pub fn gaps_ms(&self) -> Vec<u128> {
        self.calls()
            .windows(2)
            .map(|w| (w[1].at - w[0].at).as_millis())
            .collect()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.calls().last().map(|c| c.request.clone())
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            let path = request.url.split('?').next().unwrap_or_default().to_string();
            let routed = state
                .routes
                .lock()
                .unwrap()
                .iter()
                .find(|(suffix, _)| path.ends_with(suffix.as_str()))
                .map(|(_, reply)| reply.clone());
            let reply = match routed {
                Some(reply) => reply,
                None => {
                    let queued = state.replies.lock().unwrap().pop_front();
                    match queued {
                        Some(reply) => reply,
                        None => state.otherwise.lock().unwrap().clone(),
                    }
                }
            };
            state.calls.lock().unwrap().push(Call {
                request,
                at: Instant::now(),
            });

            match reply {
                Reply::Status(status, body) => Ok(HttpResponse::new(status, body)),
                Reply::NetworkError => Err(TransportError::Connect("connection refused".to_string())),
                Reply::Hang => std::future::pending().await,
            }
        }
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::for_origin(ORIGIN)
}

pub fn client(transport: &ScriptedTransport) -> ApiClient<ScriptedTransport> {
    ClientBuilder::new(config()).build(transport.clone())
}

pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "optica-it-{}-{}-{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ))
}
