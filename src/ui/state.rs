// src/ui/state.rs - Reactive mirrors of the store snapshots

use std::time::Duration;

use dioxus::prelude::*;

use crate::app::AppStores;
use crate::auth::SessionState;
use crate::store::{BidsState, CartState, CatalogState, SearchState};

/// Signals the pages render from. Stores stay the source of truth; call one
/// of the `sync_*` methods after an operation to publish its result.
#[derive(Clone, Copy)]
pub struct UiState {
    pub session: Signal<SessionState>,
    pub cart: Signal<CartState>,
    pub bids: Signal<BidsState>,
    pub catalog: Signal<CatalogState>,
    pub search: Signal<SearchState>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            session: Signal::new(SessionState::default()),
            cart: Signal::new(CartState::default()),
            bids: Signal::new(BidsState::default()),
            catalog: Signal::new(CatalogState::default()),
            search: Signal::new(SearchState::default()),
        }
    }

    pub async fn sync_all(self, stores: &AppStores) {
        self.sync_session(stores).await;
        self.sync_cart(stores).await;
        self.sync_bids(stores).await;
        self.sync_catalog(stores).await;
        self.sync_search(stores).await;
    }

    pub async fn sync_session(mut self, stores: &AppStores) {
        let snapshot = stores.session.snapshot().await;
        self.session.set(snapshot);
    }

    pub async fn sync_cart(mut self, stores: &AppStores) {
        let snapshot = stores.cart.snapshot().await;
        self.cart.set(snapshot);
    }

    pub async fn sync_bids(mut self, stores: &AppStores) {
        let snapshot = stores.bids.snapshot().await;
        self.bids.set(snapshot);
    }

    pub async fn sync_catalog(mut self, stores: &AppStores) {
        let snapshot = stores.catalog.snapshot().await;
        self.catalog.set(snapshot);
    }

    pub async fn sync_search(mut self, stores: &AppStores) {
        let snapshot = stores.search.snapshot().await;
        self.search.set(snapshot);
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn use_stores() -> AppStores {
    use_context::<AppStores>()
}

pub fn use_ui() -> UiState {
    use_context::<UiState>()
}

/// Runtime-agnostic delay for UI loops
pub async fn sleep(duration: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::TimeoutFuture::new(duration.as_millis() as u32).await;
}
