// src/app/mod.rs - Application core: builds the client and the stores

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::error::Result;
use crate::manager::{HealthStatus, ManagedState, Manager, ManagerState, ManagerStatus};
use crate::platform::{self, PlatformProviders};
#[cfg(not(target_arch = "wasm32"))]
use crate::store::{BidQuery, PollHandle};
use crate::store::{BidsStore, CartStore, CatalogStore, SearchStore};

/// Store handles shared with the presentation layer. Cloning is cheap; all
/// clones see the same state.
#[derive(Debug, Clone)]
pub struct AppStores {
    pub config: AppConfig,
    pub client: ApiClient,
    pub session: SessionStore,
    pub cart: CartStore,
    pub bids: BidsStore,
    pub catalog: CatalogStore,
    pub search: SearchStore,
}

impl AppStores {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.polling.interval_ms)
    }

    /// Restores the session, then loads the draft when a token is present.
    /// Returns whether the draft loaded cleanly.
    pub async fn bootstrap(&self) -> bool {
        match self.session.restore().await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("no stored session"),
            Err(e) => tracing::warn!("session restore failed: {}", e.message),
        }

        if !self.client.has_token() {
            return true;
        }

        match self.cart.fetch_cart().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("initial cart load failed: {}", e.message);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub version: String,
    pub state: ManagerState,
    pub authenticated: bool,
    pub moderator: bool,
    pub draft_bid_id: Option<i64>,
    pub draft_items: u32,
}

pub struct ApplicationCore {
    state: ManagedState,
    config: AppConfig,
    stores: AppStores,
    #[cfg(not(target_arch = "wasm32"))]
    polling: parking_lot::Mutex<Option<PollHandle>>,
}

impl std::fmt::Debug for ApplicationCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationCore")
            .field("base_url", &self.config.api.base_url)
            .field("client", &self.stores.client)
            .finish()
    }
}

impl ApplicationCore {
    /// Creates the core on top of the current target's providers
    pub fn new(config: AppConfig) -> Result<Self> {
        let providers = platform::create_providers()?;
        Ok(Self::with_providers(config, providers))
    }

    pub fn with_providers(config: AppConfig, providers: PlatformProviders) -> Self {
        let client = ApiClient::new(providers.network.clone(), &config.api);
        let cart = CartStore::new(client.clone());
        let search = SearchStore::new();
        let session = SessionStore::new(
            client.clone(),
            providers.storage.clone(),
            cart.clone(),
            search.clone(),
        );
        let bids = BidsStore::new(client.clone(), session.clone());
        let catalog = CatalogStore::new(client.clone(), config.catalog.offline_fallback);

        let stores = AppStores {
            config: config.clone(),
            client,
            session,
            cart,
            bids,
            catalog,
            search,
        };

        Self {
            state: ManagedState::new(Uuid::new_v4(), "application_core"),
            config,
            stores,
            #[cfg(not(target_arch = "wasm32"))]
            polling: parking_lot::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn stores(&self) -> AppStores {
        self.stores.clone()
    }

    /// Starts background bid polling, replacing any running poller.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn start_bid_polling(&self, query: BidQuery) {
        let handle = self
            .stores
            .bids
            .start_polling(query, self.stores.poll_interval());
        if let Some(previous) = self.polling.lock().replace(handle) {
            previous.cancel();
        }
    }

    /// Stops the background poller and waits for its last tick.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn stop_bid_polling(&self) {
        let handle = self.polling.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn is_polling(&self) -> bool {
        self.polling.lock().as_ref().is_some_and(|handle| !handle.is_cancelled())
    }

    pub async fn stats(&self) -> ApplicationStats {
        let session = self.stores.session.snapshot().await;
        let cart = self.stores.cart.snapshot().await;
        ApplicationStats {
            version: crate::VERSION.to_string(),
            state: self.state.state().await,
            authenticated: session.is_authenticated(),
            moderator: session.is_moderator(),
            draft_bid_id: cart.bid_id,
            draft_items: cart.item_count,
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl Manager for ApplicationCore {
    fn name(&self) -> &str {
        "application_core"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;
        tracing::info!(base_url = %self.config.api.base_url, "starting application core");

        if !self.stores.bootstrap().await {
            self.state.set_health(HealthStatus::Degraded).await;
        }

        self.state.set_state(ManagerState::Running).await;
        tracing::info!("application core ready");
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::ShuttingDown).await;

        #[cfg(not(target_arch = "wasm32"))]
        self.stop_bid_polling().await;

        self.stores.bids.clear().await;
        self.stores.catalog.clear().await;

        self.state.set_state(ManagerState::Shutdown).await;
        tracing::info!("application core stopped");
        Ok(())
    }

    async fn status(&self) -> ManagerStatus {
        let mut status = self.state.status().await;
        let stats = self.stats().await;
        status.add_metadata("base_url", serde_json::Value::from(self.config.api.base_url.clone()));
        status.add_metadata("authenticated", serde_json::Value::from(stats.authenticated));
        status.add_metadata("draft_items", serde_json::Value::from(stats.draft_items));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, SESSION_KEY};
    use crate::platform::mock::MockNetwork;
    use crate::platform::{MemoryStorage, StorageProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn core_with(network: Arc<MockNetwork>, storage: Arc<MemoryStorage>) -> ApplicationCore {
        let mut config = AppConfig::default();
        config.api.base_url = "http://ups.test".to_string();
        ApplicationCore::with_providers(config, PlatformProviders { network, storage })
    }

    #[tokio::test]
    async fn test_initialize_restores_session_then_loads_cart() {
        let network = Arc::new(MockNetwork::new());
        network.on("GET", "/api/bidUPS", 200, json!({ "data": { "bid_id": 4, "items_count": 2 } }));
        let storage = Arc::new(MemoryStorage::new());
        let session = Session {
            username: "user1".to_string(),
            token: "tok".to_string(),
            user_id: Some(3),
            is_moderator: false,
        };
        storage
            .set(SESSION_KEY, &serde_json::to_vec(&session).unwrap())
            .await
            .unwrap();

        let mut core = core_with(network.clone(), storage);
        core.initialize().await.unwrap();

        let stats = core.stats().await;
        assert!(stats.authenticated);
        assert_eq!(stats.draft_bid_id, Some(4));
        assert_eq!(stats.draft_items, 2);
        assert_eq!(core.health_check().await, HealthStatus::Healthy);

        let auth = network.requests()[0].headers.get("Authorization").cloned();
        assert_eq!(auth.as_deref(), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn test_initialize_without_session_makes_no_requests() {
        let network = Arc::new(MockNetwork::new());
        let mut core = core_with(network.clone(), Arc::new(MemoryStorage::new()));

        core.initialize().await.unwrap();
        assert_eq!(network.request_count(), 0);
        assert!(!core.stats().await.authenticated);

        core.shutdown().await.unwrap();
        assert_eq!(core.status().await.state, ManagerState::Shutdown);
    }

    #[tokio::test]
    async fn test_stores_share_state() {
        let network = Arc::new(MockNetwork::new());
        let core = core_with(network, Arc::new(MemoryStorage::new()));

        let stores = core.stores();
        stores.search.set_search_value("ИБП").await;
        assert_eq!(core.stores().search.snapshot().await.search_value, "ИБП");
        assert_eq!(stores.poll_interval(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bid_polling_runs_until_shutdown() {
        let network = Arc::new(MockNetwork::new());
        network.on(
            "GET",
            "/api/bidUPSAll",
            200,
            json!({ "data": { "bid_ups": [
                { "id": 1, "status": "сформирован", "creator_login": "user1" },
                { "id": 2, "status": "черновик", "creator_login": "other" }
            ] } }),
        );
        let storage = Arc::new(MemoryStorage::new());
        let session = Session {
            username: "user1".to_string(),
            token: "tok".to_string(),
            user_id: Some(3),
            is_moderator: false,
        };
        storage
            .set(SESSION_KEY, &serde_json::to_vec(&session).unwrap())
            .await
            .unwrap();

        let mut core = core_with(network.clone(), storage);
        core.initialize().await.unwrap();
        assert!(!core.is_polling());

        core.start_bid_polling(BidQuery::default());
        assert!(core.is_polling());
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let polls = || {
            network
                .calls()
                .iter()
                .filter(|call| *call == "GET /api/bidUPSAll")
                .count()
        };
        assert!(polls() >= 2);
        let ids: Vec<i64> = core.stores().bids.snapshot().await.items.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1]);

        core.shutdown().await.unwrap();
        assert!(!core.is_polling());
        let after_shutdown = polls();
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(polls(), after_shutdown);
        assert!(core.stores().bids.snapshot().await.items.is_empty());
    }
}
