// src/platform/storage.rs

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

#[cfg(not(target_arch = "wasm32"))]
pub type DynStorage = dyn StorageProvider + Send + Sync;

#[cfg(target_arch = "wasm32")]
pub type DynStorage = dyn StorageProvider + Sync;

pub type StorageArc = Arc<DynStorage>;

/// Storage operations (key-value)
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait StorageProvider: StorageBounds {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[cfg(not(target_arch = "wasm32"))]
pub trait StorageBounds: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait StorageBounds: Sync {}

/// Process-local storage for headless runs and tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StorageBounds for MemoryStorage {}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl StorageProvider for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.get("session").await.unwrap().is_none());

        storage.set("session", b"{}").await.unwrap();
        assert_eq!(storage.get("session").await.unwrap(), Some(b"{}".to_vec()));

        storage.delete("session").await.unwrap();
        storage.delete("session").await.unwrap();
        assert!(storage.is_empty());
    }
}
