// src/platform/native.rs - Native platform implementations

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use crate::error::{Error, Result};
use crate::platform::network::{NetworkBounds, NetworkProvider, NetworkRequest, NetworkResponse};
use crate::platform::storage::{StorageBounds, StorageProvider};
use crate::platform::PlatformProviders;

/// Creates native platform providers
pub fn create_providers() -> Result<PlatformProviders> {
    Ok(PlatformProviders {
        network: Arc::new(NativeNetwork::new()),
        storage: Arc::new(NativeStorage::new()),
    })
}

/// `reqwest`-backed transport
#[derive(Debug, Default)]
pub struct NativeNetwork {
    client: reqwest::Client,
}

impl NativeNetwork {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl NetworkBounds for NativeNetwork {}

#[async_trait]
impl NetworkProvider for NativeNetwork {
    async fn request(&self, request: NetworkRequest) -> Result<NetworkResponse> {
        let mut req = match request.method.as_str() {
            "GET" => self.client.get(&request.url),
            "POST" => self.client.post(&request.url),
            "PUT" => self.client.put(&request.url),
            "DELETE" => self.client.delete(&request.url),
            _ => {
                return Err(Error::platform(
                    "native",
                    "network",
                    format!("Unsupported HTTP method: {}", request.method),
                ))
            }
        };

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout_ms) = request.timeout_ms {
            req = req.timeout(std::time::Duration::from_millis(timeout_ms));
        }

        let response = req.send().await.map_err(|e| {
            Error::platform("native", "network", format!("HTTP request failed: {}", e))
        })?;

        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| {
                Error::platform(
                    "native",
                    "network",
                    format!("Failed to read response body: {}", e),
                )
            })?
            .to_vec();

        Ok(NetworkResponse {
            status_code,
            headers,
            body,
        })
    }
}

/// One file per key under the user's data directory
#[derive(Debug, Clone)]
pub struct NativeStorage {
    storage_path: PathBuf,
}

impl NativeStorage {
    pub fn new() -> Self {
        let base = dirs::data_dir()
            .or_else(|| std::env::current_dir().ok().map(|dir| dir.join("data")))
            .unwrap_or_else(|| PathBuf::from("data"));
        Self::at(base.join("ups_calc").join("storage"))
    }

    pub fn at(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.storage_path.join(format!("{}.json", safe_key))
    }
}

impl Default for NativeStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBounds for NativeStorage {}

#[async_trait]
impl StorageProvider for NativeStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_to_path(key);
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::platform(
                "native",
                "storage",
                format!("Failed to read key {}: {}", key, e),
            )),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.storage_path).await.map_err(|e| {
            Error::platform(
                "native",
                "storage",
                format!("Failed to create storage directory: {}", e),
            )
        })?;

        fs::write(self.key_to_path(key), value).await.map_err(|e| {
            Error::platform(
                "native",
                "storage",
                format!("Failed to write key {}: {}", key, e),
            )
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_to_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::platform(
                "native",
                "storage",
                format!("Failed to delete key {}: {}", key, e),
            )),
        }
    }
}
