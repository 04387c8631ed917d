// src/manager.rs - Lifecycle contract for the long-lived services of the client

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::utils::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerState {
    Created,
    Initializing,
    Running,
    ShuttingDown,
    Shutdown,
    Error,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Initializing => write!(f, "INITIALIZING"),
            Self::Running => write!(f, "RUNNING"),
            Self::ShuttingDown => write!(f, "SHUTTING_DOWN"),
            Self::Shutdown => write!(f, "SHUTDOWN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Degraded => write!(f, "DEGRADED"),
            Self::Unhealthy => write!(f, "UNHEALTHY"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub id: Uuid,
    pub name: String,
    pub state: ManagerState,
    pub health: HealthStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime: Option<Duration>,
    pub last_updated: DateTime<Utc>,
    pub message: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ManagerStatus {
    pub fn new(id: Uuid, name: impl Into<String>, state: ManagerState) -> Self {
        let now = Time::now();
        Self {
            id,
            name: name.into(),
            state,
            health: HealthStatus::Unknown,
            created_at: now,
            started_at: None,
            uptime: None,
            last_updated: now,
            message: None,
            metadata: HashMap::new(),
        }
    }

    /// Updates the state, stamping `started_at` on the first transition to running
    pub fn update_state(&mut self, state: ManagerState) {
        let now = Time::now();
        self.state = state;
        self.last_updated = now;

        if state == ManagerState::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }

        if let Some(started) = self.started_at {
            if state == ManagerState::Running {
                self.uptime = now.signed_duration_since(started).to_std().ok();
            }
        }
    }

    pub fn set_health(&mut self, health: HealthStatus) {
        self.health = health;
        self.last_updated = Time::now();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.last_updated = Time::now();
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
        self.last_updated = Time::now();
    }
}

// Native platforms require Send + Sync
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> PlatformSync for T {}

// WASM does not require Send
#[cfg(target_arch = "wasm32")]
pub trait PlatformSync {}
#[cfg(target_arch = "wasm32")]
impl<T> PlatformSync for T {}

/// Lifecycle shared by the configuration, logging and application core services
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait Manager: PlatformSync + fmt::Debug {
    fn name(&self) -> &str;

    fn id(&self) -> Uuid;

    async fn initialize(&mut self) -> Result<()>;

    async fn shutdown(&mut self) -> Result<()>;

    async fn status(&self) -> ManagerStatus;

    async fn health_check(&self) -> HealthStatus {
        let status = self.status().await;
        match status.state {
            ManagerState::Running => HealthStatus::Healthy,
            ManagerState::Initializing => HealthStatus::Degraded,
            ManagerState::Error => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }
}

/// Shared, lock-guarded status used by every `Manager` implementation
pub struct ManagedState {
    id: Uuid,
    name: String,
    status: Arc<RwLock<ManagerStatus>>,
}

impl ManagedState {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        let name_str = name.into();
        let status = ManagerStatus::new(id, name_str.clone(), ManagerState::Created);

        Self {
            id,
            name: name_str,
            status: Arc::new(RwLock::new(status)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn set_state(&self, state: ManagerState) {
        self.status.write().await.update_state(state);
    }

    pub async fn set_health(&self, health: HealthStatus) {
        self.status.write().await.set_health(health);
    }

    pub async fn set_message(&self, message: impl Into<String>) {
        self.status.write().await.set_message(message);
    }

    pub async fn add_metadata(&self, key: impl Into<String>, value: serde_json::Value) {
        self.status.write().await.add_metadata(key, value);
    }

    pub async fn status(&self) -> ManagerStatus {
        self.status.read().await.clone()
    }

    pub async fn state(&self) -> ManagerState {
        self.status.read().await.state
    }
}

impl fmt::Debug for ManagedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedState")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
