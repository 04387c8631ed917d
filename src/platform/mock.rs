// src/platform/mock.rs - Scripted transport for store tests

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::platform::network::{NetworkBounds, NetworkProvider, NetworkRequest, NetworkResponse};

#[derive(Debug, Clone)]
pub enum MockReply {
    Json(u16, Value),
    TransportError,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

/// Replies are queued per `(method, path)`; the last reply of a queue is
/// repeated. Unscripted routes answer 404.
#[derive(Debug, Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<(String, String), VecDeque<MockReply>>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: &str, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, MockReply::Json(status, body))
    }

    pub fn fail(&self, method: &str, path: &str) -> &Self {
        self.push(method, path, MockReply::TransportError)
    }

    fn push(&self, method: &str, path: &str, reply: MockReply) -> &Self {
        self.routes
            .lock()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().len()
    }

    /// `METHOD path` for every request, in order.
    pub fn calls(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    fn next_reply(&self, method: &str, path: &str) -> Option<MockReply> {
        let mut routes = self.routes.lock();
        let queue = routes.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn split_url(url: &str) -> (String, Option<String>) {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path_and_query = without_scheme
        .find('/')
        .map(|idx| &without_scheme[idx..])
        .unwrap_or("/");
    match path_and_query.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (path_and_query.to_string(), None),
    }
}

impl NetworkBounds for MockNetwork {}

#[async_trait::async_trait]
impl NetworkProvider for MockNetwork {
    async fn request(&self, request: NetworkRequest) -> Result<NetworkResponse> {
        let (path, query) = split_url(&request.url);
        let body = request
            .body
            .as_ref()
            .and_then(|raw| serde_json::from_slice(raw).ok());

        self.log.lock().push(RecordedRequest {
            method: request.method.clone(),
            path: path.clone(),
            query,
            headers: request.headers.clone(),
            body,
        });

        match self.next_reply(&request.method, &path) {
            Some(MockReply::Json(status_code, value)) => Ok(NetworkResponse {
                status_code,
                headers: HashMap::new(),
                body: serde_json::to_vec(&value)?,
            }),
            Some(MockReply::TransportError) => Err(Error::platform(
                "mock",
                "network",
                "HTTP request failed: connection refused",
            )),
            None => Ok(NetworkResponse {
                status_code: 404,
                headers: HashMap::new(),
                body: br#"{"message":"not found"}"#.to_vec(),
            }),
        }
    }
}
