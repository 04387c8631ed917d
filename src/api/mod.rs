// src/api/mod.rs - REST client for the UPS calc backend

//! Thin typed wrapper over the backend's REST endpoints
//!
//! The client owns the bearer token slot shared by every authenticated call.
//! Authenticated endpoints fail with an authentication error before any
//! request is issued when no token is held.

pub mod models;

use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::platform::{NetworkArc, NetworkRequest};

pub use models::{
    Bid, BidStatus, CartLine, CartSummary, Component, LoginRequest, LoginResponse,
    RegisterRequest, StatusKind, StatusUpdate, UpdateUserRequest,
};
use models::RawCartSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    network: NetworkArc,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    timeout_ms: Option<u64>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.has_token())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl ApiClient {
    pub fn new(network: NetworkArc, config: &ApiConfig) -> Self {
        Self {
            network,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
            timeout_ms: config.timeout_ms,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// The held token, or the not-authenticated error.
    pub fn require_token(&self) -> Result<String> {
        self.token().ok_or_else(Error::not_authenticated)
    }

    /// Absolute URL for a server-relative path such as a component image.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Performs one call and returns the decoded JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<Value> {
        let token = if authenticated {
            Some(self.require_token()?)
        } else {
            None
        };

        let mut request = NetworkRequest::new(method.as_str(), format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .timeout_ms(self.timeout_ms);

        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(&body)?);
        }

        tracing::debug!(method = method.as_str(), path, "api request");

        let response = self.network.request(request).await.map_err(|e| {
            tracing::warn!(method = method.as_str(), path, "transport failure: {}", e.message);
            e
        })?;

        if !response.is_success() {
            let message = error_message(&response.body, response.status_code);
            tracing::debug!(status = response.status_code, path, "api error: {}", message);
            return Err(Error::http(response.status_code, path, message).source("api"));
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            Error::serialization(format!("Unexpected response from {}: {}", path, e)).source("api")
        })
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::Get, path, None, true).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::Put, path, Some(body), true).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let body = self
            .send(Method::Post, "/api/login", Some(serde_json::to_value(request)?), false)
            .await?;
        decode(body)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        self.send(Method::Post, "/api/register", Some(serde_json::to_value(request)?), false)
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        self.send(Method::Post, "/api/logout", None, true).await?;
        Ok(())
    }

    pub async fn update_user(&self, user_id: i64, request: &UpdateUserRequest) -> Result<Value> {
        self.put(&format!("/api/users/{}", user_id), serde_json::to_value(request)?)
            .await
    }

    /// Current draft summary; `None` when the response carries no `data`.
    pub async fn current_cart(&self) -> Result<Option<CartSummary>> {
        let body = self.get("/api/bidUPS").await?;
        cart_summary(body)
    }

    pub async fn bid(&self, bid_id: i64) -> Result<Bid> {
        let body = self.get(&format!("/api/bidUPS/{}", bid_id)).await?;
        decode(unwrap_data(body))
    }

    pub async fn set_incoming_current(&self, bid_id: i64, incoming_current: f64) -> Result<()> {
        self.put(
            &format!("/api/bidUPS/{}", bid_id),
            json!({ "incoming_current": incoming_current }),
        )
        .await?;
        Ok(())
    }

    /// Forms the bid; the server computes and returns the UPS power.
    pub async fn form_bid(&self, bid_id: i64) -> Result<Option<f64>> {
        let body = self
            .send(Method::Put, &format!("/api/bidUPS/{}/form", bid_id), None, true)
            .await?;
        Ok(calculation_result(&body))
    }

    pub async fn decline_bid(&self, bid_id: i64, moderator_id: i64, status: &str) -> Result<StatusUpdate> {
        let body = self
            .put(
                &format!("/api/bidUPS/{}/decline", bid_id),
                json!({ "moderator_id": moderator_id, "status": status }),
            )
            .await?;
        Ok(decode(unwrap_data(body)).unwrap_or_default())
    }

    pub async fn delete_bid(&self, bid_id: i64) -> Result<()> {
        self.send(Method::Delete, &format!("/api/bidUPS/{}", bid_id), None, true)
            .await?;
        Ok(())
    }

    pub async fn all_bids(&self) -> Result<Vec<Bid>> {
        let body = self.get("/api/bidUPSAll").await?;
        match body.pointer("/data/bid_ups").or_else(|| body.get("bid_ups")) {
            Some(list @ Value::Array(_)) => decode(list.clone()),
            _ => Ok(Vec::new()),
        }
    }

    /// Attaches a component to the draft, creating the draft if needed.
    pub async fn add_component(&self, component_id: i64) -> Result<Option<CartSummary>> {
        let body = self
            .send(Method::Post, &format!("/api/component/{}", component_id), None, true)
            .await?;
        cart_summary(body)
    }

    pub async fn update_line(&self, line_id: i64, count: u32, battery_life: f64) -> Result<()> {
        self.put(
            &format!("/api/calcUPS/{}", line_id),
            json!({ "count": count, "battery_life": battery_life }),
        )
        .await?;
        Ok(())
    }

    pub async fn remove_line(&self, bid_id: i64, line_id: i64) -> Result<Option<CartSummary>> {
        let body = self
            .send(
                Method::Delete,
                "/api/calcUPS",
                Some(json!({ "bidId": bid_id, "componentId": line_id })),
                true,
            )
            .await?;
        cart_summary(body)
    }

    pub async fn components(&self, query: &str) -> Result<Vec<Component>> {
        let path = format!("/api/component?query={}", urlencoding::encode(query));
        let body = self.send(Method::Get, &path, None, false).await?;
        let list = if body.is_array() {
            body
        } else {
            body.pointer("/data/Components")
                .or_else(|| body.get("Components"))
                .cloned()
                .unwrap_or(Value::Array(Vec::new()))
        };
        let components: Vec<Component> = decode(list)?;
        Ok(components.into_iter().filter(|c| !c.is_delete).collect())
    }

    pub async fn component(&self, component_id: i64) -> Result<Component> {
        let body = self
            .send(Method::Get, &format!("/api/components/{}", component_id), None, false)
            .await?;
        let body = match body.get("component") {
            Some(inner) => inner.clone(),
            None => unwrap_data(body),
        };
        decode(body)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::serialization(format!("Unexpected response shape: {}", e)).source("api")
    })
}

/// `{data: X}` → `X`; anything else unchanged.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").map_or(false, Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// The `data` summary of a cart response. Plain acknowledgements carry none.
fn cart_summary(body: Value) -> Result<Option<CartSummary>> {
    match body.get("data") {
        Some(data) if data.is_object() => Ok(Some(decode::<RawCartSummary>(data.clone())?.into())),
        _ => Ok(None),
    }
}

fn calculation_result(body: &Value) -> Option<f64> {
    body.pointer("/data/result")
        .or_else(|| body.get("result"))
        .or_else(|| body.pointer("/data/calculated_power_count"))
        .and_then(Value::as_f64)
}

/// The server's `message`/`error` text, or a generic status message.
fn error_message(body: &[u8], status_code: u16) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| format!("HTTP error: {}", status_code))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::platform::mock::MockNetwork;

    pub(crate) fn client_with(network: Arc<MockNetwork>) -> ApiClient {
        let config = ApiConfig {
            base_url: "http://ups.test/".to_string(),
            timeout_ms: Some(5_000),
        };
        ApiClient::new(network, &config)
    }

    #[tokio::test]
    async fn test_authenticated_call_without_token_sends_nothing() {
        let network = Arc::new(MockNetwork::new());
        let client = client_with(network.clone());

        let error = client.current_cart().await.unwrap_err();
        assert!(error.is_not_authenticated());
        assert_eq!(network.request_count(), 0);
    }

    #[tokio::test]
    async fn test_headers_and_error_message() {
        let network = Arc::new(MockNetwork::new());
        network.on(
            "PUT",
            "/api/bidUPS/3",
            409,
            json!({ "message": "bid is not a draft" }),
        );
        let client = client_with(network.clone());
        client.set_token(Some("tok".to_string()));

        let error = client.set_incoming_current(3, 12.5).await.unwrap_err();
        assert_eq!(error.status_code(), Some(409));
        assert_eq!(error.user_message(), "bid is not a draft");

        let request = &network.requests()[0];
        assert_eq!(request.headers["Authorization"], "Bearer tok");
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert_eq!(request.body, Some(json!({ "incoming_current": 12.5 })));
    }

    #[tokio::test]
    async fn test_status_only_error_message() {
        let network = Arc::new(MockNetwork::new());
        let client = client_with(network.clone());
        client.set_token(Some("tok".to_string()));

        let error = client.delete_bid(8).await.unwrap_err();
        assert_eq!(error.status_code(), Some(404));
        assert_eq!(error.user_message(), "not found");

        network.on("DELETE", "/api/bidUPS/9", 500, json!({}));
        let error = client.delete_bid(9).await.unwrap_err();
        assert_eq!(error.user_message(), "HTTP error: 500");
    }

    #[tokio::test]
    async fn test_components_query_is_encoded_and_deleted_dropped() {
        let network = Arc::new(MockNetwork::new());
        network.on(
            "GET",
            "/api/component",
            200,
            json!({ "data": { "Components": [
                { "id": 1, "title": "Сервер", "power": 0.4, "coeff": 0.9 },
                { "id": 2, "title": "Старый", "is_delete": true }
            ] } }),
        );
        let client = client_with(network.clone());

        let components = client.components("блок питания").await.unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].id, 1);

        let request = &network.requests()[0];
        assert_eq!(
            request.query.as_deref(),
            Some("query=%D0%B1%D0%BB%D0%BE%D0%BA%20%D0%BF%D0%B8%D1%82%D0%B0%D0%BD%D0%B8%D1%8F")
        );
        assert!(!request.headers.contains_key("Authorization"));
    }

    #[test]
    fn test_form_result_shapes() {
        assert_eq!(calculation_result(&json!({ "data": { "result": 2.5 } })), Some(2.5));
        assert_eq!(calculation_result(&json!({ "result": 4 })), Some(4.0));
        assert_eq!(
            calculation_result(&json!({ "data": { "calculated_power_count": 1.25 } })),
            Some(1.25)
        );
        assert_eq!(calculation_result(&Value::Null), None);
    }

    #[test]
    fn test_cart_summary_needs_data() {
        assert_eq!(
            cart_summary(json!({ "data": { "bid_id": 5, "items_count": 3 } })).unwrap(),
            Some(CartSummary {
                bid_id: Some(5),
                items_count: 3
            })
        );
        assert_eq!(cart_summary(json!({ "message": "ok" })).unwrap(), None);
        assert_eq!(cart_summary(json!({ "data": null })).unwrap(), None);
        assert_eq!(cart_summary(json!({})).unwrap(), None);
        assert_eq!(cart_summary(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_resolve_image_paths() {
        let client = client_with(Arc::new(MockNetwork::new()));
        assert_eq!(client.resolve("/img/1.png"), "http://ups.test/img/1.png");
        assert_eq!(client.resolve("https://cdn/x.png"), "https://cdn/x.png");
    }
}
