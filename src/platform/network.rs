// src/platform/network.rs

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One HTTP round-trip as seen by the REST client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub timeout_ms: Option<u64>,
}

impl NetworkRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout_ms: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl NetworkResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub type DynNetwork = dyn NetworkProvider + Send + Sync;

#[cfg(target_arch = "wasm32")]
pub type DynNetwork = dyn NetworkProvider + Sync;

pub type NetworkArc = Arc<DynNetwork>;

/// Transport used by the REST client. Non-2xx statuses are returned as
/// responses; only transport failures are errors.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait NetworkProvider: NetworkBounds {
    async fn request(&self, request: NetworkRequest) -> Result<NetworkResponse>;
}

#[cfg(not(target_arch = "wasm32"))]
pub trait NetworkBounds: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait NetworkBounds: Sync {}
