// src/store/bids.rs - Bid listing, filters and moderation

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::api::{ApiClient, Bid, BidStatus, StatusKind};
use crate::auth::SessionStore;
use crate::error::{Error, Result};
use crate::utils;

/// Listing filters. Empty strings and `None` mean "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BidQuery {
    pub creator: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BidQuery {
    pub fn has_date_range(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Applies the listing filters. Bound days are inclusive; a bid without a
/// readable `date_update` is dropped while any date bound is set.
pub fn filter_bids(bids: &[Bid], query: &BidQuery) -> Vec<Bid> {
    let creator = non_blank(&query.creator);
    let status = non_blank(&query.status);

    bids.iter()
        .filter(|bid| creator.map_or(true, |c| utils::contains_folded(&bid.creator_login, c)))
        .filter(|bid| status.map_or(true, |s| bid.status.matches(s)))
        .filter(|bid| {
            if !query.has_date_range() {
                return true;
            }
            let Some(updated) = bid.updated_on() else {
                return false;
            };
            query.start_date.map_or(true, |s| updated >= s)
                && query.end_date.map_or(true, |e| updated <= e)
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BidsState {
    pub items: Vec<Bid>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BidsStore {
    client: ApiClient,
    session: SessionStore,
    state: Arc<RwLock<BidsState>>,
}

impl BidsStore {
    pub fn new(client: ApiClient, session: SessionStore) -> Self {
        Self {
            client,
            session,
            state: Arc::new(RwLock::new(BidsState::default())),
        }
    }

    pub async fn snapshot(&self) -> BidsState {
        self.state.read().await.clone()
    }

    /// Non-moderators only ever see their own bids.
    async fn effective_query(&self, query: &BidQuery) -> BidQuery {
        let session = self.session.snapshot().await;
        if session.is_moderator() {
            return query.clone();
        }
        BidQuery {
            creator: session.username().map(str::to_string),
            ..query.clone()
        }
    }

    pub async fn fetch_bids(&self, query: &BidQuery) -> Result<Vec<Bid>> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let query = self.effective_query(query).await;
        let result = self.client.all_bids().await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(bids) => {
                let items = filter_bids(&bids, &query);
                tracing::debug!(total = bids.len(), shown = items.len(), "bids loaded");
                state.items = items.clone();
                Ok(items)
            }
            Err(e) => {
                tracing::error!("failed to load bids: {}", e.message);
                state.items.clear();
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Completes or rejects a formed bid. Only moderators may call this.
    /// Returns the merged record, or `None` when the bid is not in the
    /// current listing.
    pub async fn update_status(
        &self,
        bid_id: i64,
        new_status: &str,
        moderator_id: i64,
    ) -> Result<Option<Bid>> {
        let checked = self.check_moderation(new_status).await;
        if let Err(e) = checked {
            tracing::error!(bid_id, "status change refused: {}", e.message);
            self.state.write().await.error = Some(e.user_message());
            return Err(e);
        }

        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.client.decline_bid(bid_id, moderator_id, new_status).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(update) => {
                tracing::info!(bid_id, status = new_status, "bid status changed");
                let mut merged = None;
                for bid in state.items.iter_mut().filter(|b| b.id == bid_id) {
                    bid.status = BidStatus::new(new_status);
                    if update.date_finish.is_some() {
                        bid.date_finish = update.date_finish.clone();
                    }
                    if update.moderator_login.is_some() {
                        bid.moderator_login = update.moderator_login.clone();
                    }
                    merged = Some(bid.clone());
                }
                Ok(merged)
            }
            Err(e) => {
                tracing::error!(bid_id, "failed to change bid status: {}", e.message);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    async fn check_moderation(&self, new_status: &str) -> Result<()> {
        if !self.session.snapshot().await.is_moderator() {
            return Err(Error::authorization(
                "bid",
                "update_status",
                "Only moderators can change a bid's status",
            ));
        }
        match StatusKind::parse(new_status) {
            Some(StatusKind::Completed | StatusKind::Rejected) => Ok(()),
            _ => Err(Error::validation(
                "status",
                format!(
                    "Status must be '{}' or '{}', got '{}'",
                    StatusKind::Completed.tag(),
                    StatusKind::Rejected.tag(),
                    new_status
                ),
            )),
        }
    }

    pub async fn clear(&self) {
        *self.state.write().await = BidsState::default();
    }

    /// Re-fetches the listing every `interval` until the handle is cancelled
    /// or dropped. Each tick overwrites the state, failed ones included.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn start_polling(&self, query: BidQuery, interval: std::time::Duration) -> PollHandle {
        let token = tokio_util::sync::CancellationToken::new();
        let child = token.child_token();
        let store = self.clone();

        tracing::debug!(interval_ms = interval.as_millis() as u64, "bid polling started");
        let task = tokio::spawn(async move {
            loop {
                if let Err(e) = store.fetch_bids(&query).await {
                    tracing::debug!("poll tick failed: {}", e.message);
                }
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::debug!("bid polling stopped");
        });

        PollHandle {
            token,
            task: Some(task),
        }
    }
}

/// Stops the polling task when cancelled or dropped.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct PollHandle {
    token: tokio_util::sync::CancellationToken,
    task: Option<tokio::task::JoinHandle<()>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl PollHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels and waits for the task to finish its current tick.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("polling task ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::client_with;
    use crate::api::LoginRequest;
    use crate::auth::jwt::encode_token;
    use crate::platform::mock::MockNetwork;
    use crate::platform::MemoryStorage;
    use crate::store::{CartStore, SearchStore};
    use serde_json::{json, Value};

    fn bid(id: i64, creator: &str, status: &str, date_update: Option<&str>) -> Bid {
        serde_json::from_value(json!({
            "id": id,
            "creator_login": creator,
            "status": status,
            "date_update": date_update,
        }))
        .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn listing() -> Value {
        json!({ "data": { "bid_ups": [
            { "id": 5, "creator_login": "user1", "status": "сформирован", "date_update": "2024-03-10T12:00:00Z" },
            { "id": 6, "creator_login": "admin2", "status": "завершена", "date_update": "2024-03-11T08:00:00Z" },
            { "id": 7, "creator_login": "user1", "status": "черновик" }
        ] } })
    }

    async fn store_for(network: &Arc<MockNetwork>, claims: Value, login: &str) -> BidsStore {
        network.on("POST", "/api/login", 200, json!({ "access_token": encode_token(&claims) }));
        let client = client_with(network.clone());
        let session = SessionStore::new(
            client.clone(),
            Arc::new(MemoryStorage::new()),
            CartStore::new(client.clone()),
            SearchStore::default(),
        );
        session.login(LoginRequest::new(login, "pw")).await.unwrap();
        BidsStore::new(client, session)
    }

    #[test]
    fn test_creator_filter_is_substring() {
        let bids = vec![bid(1, "admin2", "черновик", None), bid(2, "root", "черновик", None)];
        let query = BidQuery {
            creator: Some("ADMIN".to_string()),
            ..Default::default()
        };
        let ids: Vec<i64> = filter_bids(&bids, &query).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_status_filter_is_exact() {
        let bids = vec![bid(1, "a", "Сформирован", None), bid(2, "a", "сформ", None)];
        let query = BidQuery {
            status: Some("сформирован".to_string()),
            ..Default::default()
        };
        let ids: Vec<i64> = filter_bids(&bids, &query).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_date_range_includes_boundary_days() {
        let bids = vec![
            bid(1, "a", "x", Some("2024-03-09T23:59:59Z")),
            bid(2, "a", "x", Some("2024-03-10T00:00:00Z")),
            bid(3, "a", "x", Some("2024-03-12T23:59:59Z")),
            bid(4, "a", "x", Some("2024-03-13T00:00:00Z")),
            bid(5, "a", "x", None),
            bid(6, "a", "x", Some("garbage")),
        ];
        let query = BidQuery {
            start_date: day(2024, 3, 10),
            end_date: day(2024, 3, 12),
            ..Default::default()
        };
        let ids: Vec<i64> = filter_bids(&bids, &query).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let open_ended = BidQuery {
            start_date: day(2024, 3, 12),
            ..Default::default()
        };
        let ids: Vec<i64> = filter_bids(&bids, &open_ended).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 4]);

        assert_eq!(filter_bids(&bids, &BidQuery::default()).len(), 6);
    }

    #[test]
    fn test_date_range_uses_the_stamp_offset() {
        let bids = vec![
            bid(1, "a", "x", Some("2024-03-10T01:00:00+03:00")),
            bid(2, "a", "x", Some("2024-03-09T23:30:00-02:00")),
            bid(3, "a", "x", Some("2024-03-10T12:00:00")),
        ];
        let query = BidQuery {
            start_date: day(2024, 3, 10),
            end_date: day(2024, 3, 10),
            ..Default::default()
        };
        let ids: Vec<i64> = filter_bids(&bids, &query).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_fetch_requires_session() {
        let network = Arc::new(MockNetwork::new());
        let client = client_with(network.clone());
        let session = SessionStore::new(
            client.clone(),
            Arc::new(MemoryStorage::new()),
            CartStore::new(client.clone()),
            SearchStore::default(),
        );
        let store = BidsStore::new(client, session);

        assert!(store.fetch_bids(&BidQuery::default()).await.unwrap_err().is_not_authenticated());
        assert_eq!(network.request_count(), 0);
    }

    #[tokio::test]
    async fn test_non_moderator_sees_own_bids_only() {
        let network = Arc::new(MockNetwork::new());
        network.on("GET", "/api/bidUPSAll", 200, listing());
        let store = store_for(&network, json!({ "user_db_id": 3 }), "user1").await;

        let query = BidQuery {
            creator: Some("admin".to_string()),
            ..Default::default()
        };
        let ids: Vec<i64> = store.fetch_bids(&query).await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![5, 7]);
    }

    #[tokio::test]
    async fn test_moderator_rejects_formed_bid() {
        let network = Arc::new(MockNetwork::new());
        network
            .on("GET", "/api/bidUPSAll", 200, listing())
            .on(
                "PUT",
                "/api/bidUPS/5/decline",
                200,
                json!({ "data": { "date_finish": "2024-03-12T10:00:00Z", "moderator_login": "moder" } }),
            );
        let store = store_for(&network, json!({ "IsModerator": true, "user_db_id": 7 }), "moder").await;

        store.fetch_bids(&BidQuery::default()).await.unwrap();
        assert_eq!(store.snapshot().await.items.len(), 3);

        let merged = store.update_status(5, "rejected", 7).await.unwrap().unwrap();
        assert_eq!(merged.status.as_str(), "rejected");
        assert_eq!(merged.moderator_login.as_deref(), Some("moder"));
        assert!(merged.finished_at().is_some());

        let local = store.snapshot().await;
        assert_eq!(local.items.iter().find(|b| b.id == 5), Some(&merged));

        let request = network.requests().pop().unwrap();
        assert_eq!(request.body, Some(json!({ "moderator_id": 7, "status": "rejected" })));
    }

    #[tokio::test]
    async fn test_non_moderator_refused_before_request() {
        let network = Arc::new(MockNetwork::new());
        let store = store_for(&network, json!({ "user_db_id": 3 }), "user1").await;
        let before = network.request_count();

        let err = store.update_status(5, "завершена", 3).await.unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Authorization { .. }));
        assert_eq!(network.request_count(), before);
        assert!(store.snapshot().await.error.is_some());
    }

    #[tokio::test]
    async fn test_moderator_cannot_set_other_statuses() {
        let network = Arc::new(MockNetwork::new());
        let store = store_for(&network, json!({ "IsModerator": true, "user_db_id": 7 }), "moder").await;
        let before = network.request_count();

        let err = store.update_status(5, "черновик", 7).await.unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Validation { .. }));
        assert_eq!(network.request_count(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_stops_when_handle_dropped() {
        let network = Arc::new(MockNetwork::new());
        network.on("GET", "/api/bidUPSAll", 200, listing());
        let store = store_for(&network, json!({ "IsModerator": true }), "moder").await;

        let handle = store.start_polling(BidQuery::default(), std::time::Duration::from_millis(1000));
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        let polled = network.calls().iter().filter(|c| *c == "GET /api/bidUPSAll").count();
        assert!(polled >= 2);

        handle.stop().await;
        let after_stop = network.request_count();
        tokio::time::sleep(std::time::Duration::from_millis(3000)).await;
        assert_eq!(network.request_count(), after_stop);
        assert_eq!(store.snapshot().await.items.len(), 3);
    }
}
