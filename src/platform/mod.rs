// src/platform/mod.rs - Transport and persistence seams

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub mod mock;

pub mod network;
pub mod storage;

pub use network::{NetworkArc, NetworkProvider, NetworkRequest, NetworkResponse};
pub use storage::{MemoryStorage, StorageArc, StorageProvider};

use crate::error::Result;

/// The adapters the REST client and the session store are built on
#[derive(Clone)]
pub struct PlatformProviders {
    pub network: NetworkArc,
    pub storage: StorageArc,
}

impl std::fmt::Debug for PlatformProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformProviders").finish_non_exhaustive()
    }
}

/// Providers for the current target
pub fn create_providers() -> Result<PlatformProviders> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        native::create_providers()
    }

    #[cfg(target_arch = "wasm32")]
    {
        web::create_providers()
    }
}
