// src/platform/web.rs - Web/WASM platform implementations

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response, Storage};

use crate::error::{Error, Result};
use crate::platform::network::{NetworkBounds, NetworkProvider, NetworkRequest, NetworkResponse};
use crate::platform::storage::{StorageBounds, StorageProvider};
use crate::platform::PlatformProviders;

/// Creates web platform providers
pub fn create_providers() -> Result<PlatformProviders> {
    Ok(PlatformProviders {
        network: Arc::new(FetchNetwork::new()),
        storage: Arc::new(WebStorage::new()),
    })
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| Error::platform("web", "window", "No window object available"))
}

/// `fetch`-backed transport
#[derive(Debug, Default)]
pub struct FetchNetwork;

impl FetchNetwork {
    pub fn new() -> Self {
        Self
    }
}

impl NetworkBounds for FetchNetwork {}

#[async_trait(?Send)]
impl NetworkProvider for FetchNetwork {
    async fn request(&self, request: NetworkRequest) -> Result<NetworkResponse> {
        let window = window()?;

        let opts = RequestInit::new();
        opts.set_method(&request.method);

        if let Some(body) = &request.body {
            let uint8_array = js_sys::Uint8Array::from(&body[..]);
            opts.set_body(&uint8_array);
        }

        let req = Request::new_with_str_and_init(&request.url, &opts).map_err(|e| {
            Error::platform("web", "network", format!("Failed to create request: {:?}", e))
        })?;

        for (key, value) in &request.headers {
            req.headers().set(key, value).map_err(|e| {
                Error::platform("web", "network", format!("Failed to set header: {:?}", e))
            })?;
        }

        let response_value = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(|e| Error::platform("web", "network", format!("Fetch failed: {:?}", e)))?;

        let response: Response = response_value
            .dyn_into()
            .map_err(|_| Error::platform("web", "network", "Fetch returned a non-Response value"))?;
        let status_code = response.status();

        let buffer = response.array_buffer().map_err(|e| {
            Error::platform("web", "network", format!("Failed to read response body: {:?}", e))
        })?;
        let body = JsFuture::from(buffer).await.map_err(|e| {
            Error::platform("web", "network", format!("Failed to read response body: {:?}", e))
        })?;

        Ok(NetworkResponse {
            status_code,
            headers: HashMap::new(),
            body: js_sys::Uint8Array::new(&body).to_vec(),
        })
    }
}

/// `localStorage`-backed key-value store
#[derive(Debug, Default)]
pub struct WebStorage;

impl WebStorage {
    pub fn new() -> Self {
        Self
    }

    fn get_storage(&self) -> Result<Storage> {
        window()?
            .local_storage()
            .map_err(|e| Error::platform("web", "storage", format!("localStorage unavailable: {:?}", e)))?
            .ok_or_else(|| Error::platform("web", "storage", "localStorage unavailable"))
    }
}

impl StorageBounds for WebStorage {}

#[async_trait(?Send)]
impl StorageProvider for WebStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_storage()?
            .get_item(key)
            .map(|value| value.map(String::into_bytes))
            .map_err(|e| Error::platform("web", "storage", format!("Failed to get item: {:?}", e)))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        // Values are JSON documents, so UTF-8 holds.
        let value_str = String::from_utf8_lossy(value);
        self.get_storage()?
            .set_item(key, &value_str)
            .map_err(|e| Error::platform("web", "storage", format!("Failed to set item: {:?}", e)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.get_storage()?
            .remove_item(key)
            .map_err(|e| Error::platform("web", "storage", format!("Failed to delete item: {:?}", e)))
    }
}
