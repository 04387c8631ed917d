// src/store/catalog.rs - Component catalog

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::{ApiClient, Component};
use crate::error::{ErrorKind, Result};
use crate::store::search::SearchState;
use crate::utils;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogState {
    pub items: Vec<Component>,
    /// `items` after the last local filter
    pub filtered: Vec<Component>,
    pub selected: Option<Component>,
    pub loading: bool,
    pub error: Option<String>,
    /// The demo catalog is shown because the backend was unreachable.
    pub offline: bool,
}

/// Built-in catalog served when the backend cannot be reached.
pub fn demo_components() -> Vec<Component> {
    [
        (1, "Первый мок компопнент", 0.25),
        (2, "Второй такой же", 0.0),
        (3, "Третий без картинки мок компонент", 0.5),
    ]
    .into_iter()
    .map(|(id, title, power)| Component {
        id,
        title: title.to_string(),
        image: None,
        power,
        coeff: 1.0,
        is_delete: false,
    })
    .collect()
}

fn title_filter(items: &[Component], search_value: &str) -> Vec<Component> {
    items
        .iter()
        .filter(|c| !c.is_delete && utils::contains_folded(&c.title, search_value))
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
pub struct CatalogStore {
    client: ApiClient,
    offline_fallback: bool,
    state: Arc<RwLock<CatalogState>>,
}

impl CatalogStore {
    pub fn new(client: ApiClient, offline_fallback: bool) -> Self {
        Self {
            client,
            offline_fallback,
            state: Arc::new(RwLock::new(CatalogState::default())),
        }
    }

    pub async fn snapshot(&self) -> CatalogState {
        self.state.read().await.clone()
    }

    pub async fn fetch_components(&self, query: &str) -> Result<Vec<Component>> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.client.components(query).await;
        let mut state = self.state.write().await;
        state.loading = false;

        match result {
            Ok(items) => {
                tracing::debug!(query, count = items.len(), "catalog loaded");
                state.items = items.clone();
                state.filtered = items.clone();
                state.offline = false;
                Ok(items)
            }
            Err(e) if self.offline_fallback && matches!(e.kind, ErrorKind::Platform { .. }) => {
                tracing::warn!("catalog unreachable, serving demo components: {}", e.message);
                let items = title_filter(&demo_components(), query);
                state.items = items.clone();
                state.filtered = items.clone();
                state.offline = true;
                Ok(items)
            }
            Err(e) => {
                tracing::error!("failed to load catalog: {}", e.message);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn fetch_component(&self, component_id: i64) -> Result<Component> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.client.component(component_id).await;
        let mut state = self.state.write().await;
        state.loading = false;

        match result {
            Ok(component) => {
                state.selected = Some(component.clone());
                Ok(component)
            }
            Err(e) => {
                if let Some(cached) = state.items.iter().find(|c| c.id == component_id).cloned() {
                    tracing::warn!(component_id, "detail unavailable, using listing entry: {}", e.message);
                    state.selected = Some(cached.clone());
                    return Ok(cached);
                }
                state.selected = None;
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Case-insensitive title filter over the fetched items; empty shows all.
    pub async fn filter_locally(&self, search_value: &str) -> Vec<Component> {
        let mut state = self.state.write().await;
        let filtered = title_filter(&state.items, search_value);
        state.filtered = filtered.clone();
        filtered
    }

    /// Title filter plus the optional power range from the search filters.
    pub async fn filter_with(&self, search: &SearchState) -> Vec<Component> {
        let mut state = self.state.write().await;
        let mut filtered = title_filter(&state.items, &search.search_value);
        if let Some(range) = search.filters.power_range {
            filtered.retain(|c| range.contains(c.power));
        }
        state.filtered = filtered.clone();
        filtered
    }

    pub async fn clear(&self) {
        *self.state.write().await = CatalogState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::client_with;
    use crate::platform::mock::MockNetwork;
    use crate::store::search::{PowerRange, SearchFilters};
    use serde_json::json;

    fn catalog_network() -> Arc<MockNetwork> {
        let network = Arc::new(MockNetwork::new());
        network.on(
            "GET",
            "/api/component",
            200,
            json!({ "data": { "Components": [
                { "id": 1, "title": "Сервер Dell", "power": 0.75, "coeff": 0.9 },
                { "id": 2, "title": "Коммутатор", "power": 0.05, "coeff": 0.95 },
                { "id": 3, "title": "Сервер HP (снят)", "power": 0.6, "is_delete": true },
                { "id": 4, "title": "Системный блок", "power": 0.3, "coeff": 0.8 }
            ] } }),
        );
        network
    }

    #[tokio::test]
    async fn test_deleted_components_never_listed() {
        let store = CatalogStore::new(client_with(catalog_network()), false);

        let items = store.fetch_components("").await.unwrap();
        assert!(items.iter().all(|c| !c.is_delete));
        assert_eq!(items.len(), 3);

        let filtered = store.filter_locally("сервер").await;
        assert_eq!(filtered.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_filter_locally_case_insensitive_and_empty() {
        let store = CatalogStore::new(client_with(catalog_network()), false);
        store.fetch_components("").await.unwrap();

        assert_eq!(store.filter_locally("БЛОК").await.len(), 1);
        assert_eq!(store.filter_locally("").await.len(), 3);
        assert!(store.filter_locally("ups").await.is_empty());
        assert!(store.snapshot().await.filtered.is_empty());
    }

    #[tokio::test]
    async fn test_filter_with_power_range() {
        let store = CatalogStore::new(client_with(catalog_network()), false);
        store.fetch_components("").await.unwrap();

        let search = SearchState {
            search_value: String::new(),
            previous_searches: Vec::new(),
            filters: SearchFilters {
                category: None,
                power_range: Some(PowerRange {
                    min: Some(0.1),
                    max: Some(0.75),
                }),
            },
        };
        let ids: Vec<i64> = store.filter_with(&search).await.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_transport_failure_without_fallback_is_an_error() {
        let network = Arc::new(MockNetwork::new());
        network.fail("GET", "/api/component");
        let store = CatalogStore::new(client_with(network), false);

        assert!(store.fetch_components("").await.is_err());
        let state = store.snapshot().await;
        assert!(state.error.is_some());
        assert!(!state.loading);
        assert!(state.items.is_empty());
    }

    #[tokio::test]
    async fn test_offline_fallback_serves_demo_catalog() {
        let network = Arc::new(MockNetwork::new());
        network.fail("GET", "/api/component");
        let store = CatalogStore::new(client_with(network), true);

        let items = store.fetch_components("").await.unwrap();
        assert_eq!(items, demo_components());
        assert!(store.snapshot().await.offline);

        let items = store.fetch_components("второй").await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_component_detail() {
        let network = catalog_network();
        network.on(
            "GET",
            "/api/components/2",
            200,
            json!({ "component": { "id": 2, "title": "Коммутатор", "power": 0.05, "coeff": 0.95 } }),
        );
        let store = CatalogStore::new(client_with(network), false);

        let component = store.fetch_component(2).await.unwrap();
        assert_eq!(component.title, "Коммутатор");
        assert_eq!(store.snapshot().await.selected, Some(component));

        assert!(store.fetch_component(99).await.is_err());
        assert!(store.snapshot().await.error.is_some());
    }
}
