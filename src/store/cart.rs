// src/store/cart.rs - The user's draft bid

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::{ApiClient, Bid, CartSummary};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub bid_id: Option<i64>,
    /// Count confirmed by the server
    pub item_count: u32,
    /// Adds issued but not yet answered
    pub pending_adds: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub calculation_result: Option<f64>,
    /// Last bid loaded with `load_bid`
    pub detail: Option<Bid>,
}

impl CartState {
    /// Count shown on the cart badge.
    pub fn displayed_count(&self) -> u32 {
        self.item_count + self.pending_adds
    }

    /// Adopts the server's summary when one came back and returns the
    /// resulting draft summary.
    fn apply_summary(&mut self, summary: Option<CartSummary>) -> CartSummary {
        if let Some(summary) = summary {
            self.bid_id = summary.bid_id;
            self.item_count = summary.items_count;
        }
        CartSummary {
            bid_id: self.bid_id,
            items_count: self.item_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CartStore {
    client: ApiClient,
    state: Arc<RwLock<CartState>>,
}

impl CartStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(CartState::default())),
        }
    }

    pub async fn snapshot(&self) -> CartState {
        self.state.read().await.clone()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn fail<T>(&self, operation: &str, error: Error) -> Result<T> {
        tracing::error!(operation, "cart operation failed: {}", error.message);
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(error.user_message());
        Err(error)
    }

    pub async fn fetch_cart(&self) -> Result<CartSummary> {
        self.begin().await;
        match self.client.current_cart().await {
            Ok(summary) => {
                let mut state = self.state.write().await;
                let current = state.apply_summary(summary);
                state.loading = false;
                Ok(current)
            }
            Err(e) => {
                {
                    let mut state = self.state.write().await;
                    state.bid_id = None;
                    state.item_count = 0;
                }
                self.fail("fetch_cart", e).await
            }
        }
    }

    /// Attaches a component. Each call creates a new line.
    pub async fn add_item(&self, component_id: i64) -> Result<CartSummary> {
        {
            let mut state = self.state.write().await;
            state.pending_adds += 1;
            state.error = None;
        }

        let result = self.client.add_component(component_id).await;

        let mut state = self.state.write().await;
        state.pending_adds = state.pending_adds.saturating_sub(1);
        match result {
            Ok(summary) => {
                let current = state.apply_summary(summary);
                tracing::info!(component_id, bid_id = ?current.bid_id, "component added to draft");
                Ok(current)
            }
            Err(e) => {
                tracing::error!(component_id, "failed to add component: {}", e.message);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn remove_item(&self, bid_id: i64, line_id: i64) -> Result<CartSummary> {
        self.begin().await;
        match self.client.remove_line(bid_id, line_id).await {
            Ok(summary) => {
                let mut state = self.state.write().await;
                let current = state.apply_summary(summary);
                if let Some(detail) = state.detail.as_mut().filter(|d| d.id == bid_id) {
                    detail.components.retain(|line| line.id != line_id);
                }
                state.loading = false;
                Ok(current)
            }
            Err(e) => self.fail("remove_item", e).await,
        }
    }

    /// Clears the current draft. Without a draft this only resets local state.
    pub async fn clear_all(&self) -> Result<()> {
        if let Err(e) = self.client.require_token() {
            return self.fail("clear_all", e).await;
        }

        let bid_id = self.state.read().await.bid_id;
        match bid_id {
            Some(bid_id) => self.clear_bid(bid_id).await,
            None => {
                self.reset().await;
                Ok(())
            }
        }
    }

    /// Deletes every line of `bid_id` and then the bid itself. Line
    /// deletions are best-effort; local state is reset whatever the server
    /// says.
    pub async fn clear_bid(&self, bid_id: i64) -> Result<()> {
        if let Err(e) = self.client.require_token() {
            return self.fail("clear_bid", e).await;
        }

        self.begin().await;

        match self.client.bid(bid_id).await {
            Ok(bid) => {
                for line in &bid.components {
                    if let Err(e) = self.client.remove_line(bid_id, line.id).await {
                        tracing::warn!(bid_id, line_id = line.id, "skipping line that failed to delete: {}", e.message);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(bid_id, "could not list draft lines before delete: {}", e.message);
            }
        }

        let deleted = self.client.delete_bid(bid_id).await;
        self.reset().await;

        match deleted {
            Ok(()) => {
                tracing::info!(bid_id, "draft cleared");
                Ok(())
            }
            Err(e) => self.fail("clear_bid", e).await,
        }
    }

    pub async fn save_incoming_current(&self, bid_id: i64, incoming_current: f64) -> Result<()> {
        self.begin().await;
        match self.client.set_incoming_current(bid_id, incoming_current).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                if let Some(detail) = state.detail.as_mut().filter(|d| d.id == bid_id) {
                    detail.incoming_current = Some(incoming_current);
                }
                state.loading = false;
                Ok(())
            }
            Err(e) => self.fail("save_incoming_current", e).await,
        }
    }

    /// Forms the bid; the server-computed power lands in `calculation_result`.
    pub async fn form_bid(&self, bid_id: i64) -> Result<Option<f64>> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
            state.calculation_result = None;
        }

        match self.client.form_bid(bid_id).await {
            Ok(result) => {
                tracing::info!(bid_id, result = ?result, "bid formed");
                let mut state = self.state.write().await;
                state.calculation_result = result;
                state.loading = false;
                Ok(result)
            }
            Err(e) => self.fail("form_bid", e).await,
        }
    }

    /// Saves the incoming current, then forms the bid.
    pub async fn submit(&self, bid_id: i64, incoming_current: f64) -> Result<Option<f64>> {
        self.save_incoming_current(bid_id, incoming_current).await?;
        self.form_bid(bid_id).await
    }

    pub async fn save_component_line(&self, line_id: i64, count: u32, battery_life: f64) -> Result<()> {
        self.begin().await;
        match self.client.update_line(line_id, count, battery_life).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                if let Some(detail) = state.detail.as_mut() {
                    for line in detail.components.iter_mut().filter(|l| l.id == line_id) {
                        line.count = count;
                        line.battery_life = battery_life;
                    }
                }
                state.loading = false;
                Ok(())
            }
            Err(e) => self.fail("save_component_line", e).await,
        }
    }

    /// Loads a bid into `detail`. An error left by an earlier operation stays
    /// visible.
    pub async fn load_bid(&self, bid_id: i64) -> Result<Bid> {
        self.state.write().await.loading = true;
        match self.client.bid(bid_id).await {
            Ok(bid) => {
                let mut state = self.state.write().await;
                state.detail = Some(bid.clone());
                state.loading = false;
                Ok(bid)
            }
            Err(e) => {
                self.state.write().await.detail = None;
                self.fail("load_bid", e).await
            }
        }
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn reset(&self) {
        *self.state.write().await = CartState::default();
    }
}
