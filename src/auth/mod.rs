// src/auth/mod.rs - Session lifecycle: login, logout, registration and profile

pub mod jwt;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::api::{ApiClient, LoginRequest, RegisterRequest, UpdateUserRequest};
use crate::error::{Error, ErrorKind, Result, ResultExt};
use crate::platform::StorageArc;
use crate::store::{CartStore, SearchStore};

pub use jwt::{claims_or_default, decode_claims, Claims, TokenError};

/// Storage key of the persisted session
pub const SESSION_KEY: &str = "ups_calc.session";

const LOGIN_FAILED: &str = "Ошибка авторизации";
const REGISTER_FAILED: &str = "Ошибка регистрации";
const PROFILE_UPDATED: &str = "Данные пользователя успешно обновлены";

/// The logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub is_moderator: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
    /// Last success notice (registration, profile update)
    pub message: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_moderator(&self) -> bool {
        self.session.as_ref().map_or(false, |s| s.is_moderator)
    }

    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.username.as_str())
    }

    pub fn user_id(&self) -> Option<i64> {
        self.session.as_ref().and_then(|s| s.user_id)
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub user_id: i64,
    pub new_login: Option<String>,
    pub new_password: Option<String>,
    pub current_password: String,
}

/// Owns the token lifecycle. Logout also tears down the cart and search state.
#[derive(Clone)]
pub struct SessionStore {
    client: ApiClient,
    storage: StorageArc,
    cart: CartStore,
    search: SearchStore,
    state: Arc<RwLock<SessionState>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("client", &self.client)
            .field("cart", &self.cart)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(client: ApiClient, storage: StorageArc, cart: CartStore, search: SearchStore) -> Self {
        Self {
            client,
            storage,
            cart,
            search,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
        state.message = None;
    }

    async fn fail<T>(&self, operation: &str, error: Error) -> Result<T> {
        tracing::error!(operation, "session operation failed: {}", error.message);
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(error.user_message());
        Err(error)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        self.begin().await;

        let response = match self.client.login(&request).await {
            Ok(response) => response,
            Err(e) => return self.fail("login", with_default_message(e, LOGIN_FAILED)).await,
        };

        let Some(token) = response.access_token.filter(|t| !t.is_empty()) else {
            return self
                .fail("login", Error::authentication(LOGIN_FAILED).source("auth"))
                .await;
        };

        let claims = claims_or_default(&token);
        let session = Session {
            username: request.login.clone(),
            token: token.clone(),
            user_id: claims.user_id,
            is_moderator: claims.is_moderator,
        };

        self.client.set_token(Some(token));
        self.persist(&session).await;

        tracing::info!(
            username = %session.username,
            moderator = session.is_moderator,
            "logged in"
        );

        let mut state = self.state.write().await;
        state.session = Some(session.clone());
        state.loading = false;
        Ok(session)
    }

    /// Creates a regular account. The user still has to log in.
    pub async fn register(&self, login: &str, password: &str) -> Result<()> {
        self.begin().await;

        let request = RegisterRequest {
            login: login.to_string(),
            password: password.to_string(),
            is_moderator: false,
        };

        match self.client.register(&request).await {
            Ok(body) => {
                tracing::info!(login, "account registered");
                let mut state = self.state.write().await;
                state.loading = false;
                state.message = server_message(&body);
                Ok(())
            }
            Err(e) => self.fail("register", with_default_message(e, REGISTER_FAILED)).await,
        }
    }

    /// Deletes the draft, ends the server session and clears every piece of
    /// client state. Server failures are logged and never stop the teardown.
    pub async fn logout(&self) -> Result<()> {
        self.begin().await;

        if self.client.has_token() {
            if let Err(e) = self.cart.clear_all().await {
                tracing::warn!("draft cleanup during logout failed: {}", e.message);
            }
            if let Err(e) = self.client.logout().await {
                tracing::warn!("server logout failed: {}", e.message);
            }
        }

        self.cart.reset().await;
        self.search.reset().await;
        self.client.set_token(None);

        if let Err(e) = self.storage.delete(SESSION_KEY).await {
            tracing::warn!("could not remove stored session: {}", e.message);
        }

        *self.state.write().await = SessionState::default();
        tracing::info!("logged out");
        Ok(())
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<()> {
        if let Err(e) = self.client.require_token() {
            return self.fail("update_profile", e).await;
        }

        self.begin().await;

        let current_username = self.state.read().await.username().map(str::to_string);
        let new_login = update
            .new_login
            .map(|login| login.trim().to_string())
            .filter(|login| !login.is_empty() && Some(login) != current_username.as_ref());

        let request = UpdateUserRequest {
            login: new_login.clone(),
            password: update
                .new_password
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| update.current_password.clone()),
            old_password: update.current_password,
        };

        let body = match self.client.update_user(update.user_id, &request).await {
            Ok(body) => body,
            Err(e) => return self.fail("update_profile", e).await,
        };

        let renamed = {
            let mut state = self.state.write().await;
            state.loading = false;
            state.message =
                Some(server_message(&body).unwrap_or_else(|| PROFILE_UPDATED.to_string()));
            let renamed = match (new_login, state.session.as_mut()) {
                (Some(login), Some(session)) => {
                    session.username = login;
                    Some(session.clone())
                }
                _ => None,
            };
            renamed
        };

        if let Some(session) = renamed {
            tracing::info!(user_id = update.user_id, login = %session.username, "login changed");
            self.persist(&session).await;
        }
        Ok(())
    }

    /// Loads a persisted session and installs its token. Returns whether one
    /// was found.
    pub async fn restore(&self) -> Result<bool> {
        let Some(raw) = self.storage.get(SESSION_KEY).await? else {
            return Ok(false);
        };

        let session: Session = match serde_json::from_slice(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("discarding corrupt stored session: {}", e);
                self.storage.delete(SESSION_KEY).await?;
                return Ok(false);
            }
        };

        tracing::info!(username = %session.username, "session restored");
        self.client.set_token(Some(session.token.clone()));
        self.state.write().await.session = Some(session);
        Ok(true)
    }

    pub async fn clear_messages(&self) {
        let mut state = self.state.write().await;
        state.error = None;
        state.message = None;
    }

    async fn persist(&self, session: &Session) {
        let stored = serde_json::to_vec(session)
            .with_context(|| "Failed to encode session".to_string());
        let result = match stored {
            Ok(bytes) => self.storage.set(SESSION_KEY, &bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!("session not persisted: {}", e.message);
        }
    }
}

/// Replaces the generic `HTTP error: N` text with the operation's own message.
fn with_default_message(error: Error, default: &str) -> Error {
    let generic = matches!(error.kind, ErrorKind::Network { .. })
        && error.message.starts_with("HTTP error:");
    if !generic {
        return error;
    }
    Error::new(error.kind.clone(), default)
        .source("auth")
        .caused_by(&error.message)
}

fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.pointer("/data/message"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::client_with;
    use crate::platform::mock::MockNetwork;
    use crate::platform::{MemoryStorage, StorageProvider};
    use jwt::encode_token;
    use serde_json::json;

    struct Fixture {
        network: Arc<MockNetwork>,
        storage: Arc<MemoryStorage>,
        cart: CartStore,
        search: SearchStore,
        session: SessionStore,
    }

    fn fixture() -> Fixture {
        let network = Arc::new(MockNetwork::new());
        let storage = Arc::new(MemoryStorage::new());
        let client = client_with(network.clone());
        let cart = CartStore::new(client.clone());
        let search = SearchStore::default();
        let session = SessionStore::new(client, storage.clone(), cart.clone(), search.clone());
        Fixture {
            network,
            storage,
            cart,
            search,
            session,
        }
    }

    #[tokio::test]
    async fn test_login_reads_claims_and_persists() {
        let f = fixture();
        let token = encode_token(&json!({ "IsModerator": true, "user_db_id": 7 }));
        f.network.on("POST", "/api/login", 200, json!({ "access_token": token }));

        let session = f.session.login(LoginRequest::new("moder", "pw")).await.unwrap();
        assert!(session.is_moderator);
        assert_eq!(session.user_id, Some(7));
        assert_eq!(session.username, "moder");
        assert!(!f.storage.is_empty());

        let body = f.network.requests()[0].body.clone();
        assert_eq!(body, Some(json!({ "login": "moder", "password": "pw" })));
    }

    #[tokio::test]
    async fn test_malformed_token_still_logs_in() {
        let f = fixture();
        f.network.on("POST", "/api/login", 200, json!({ "access_token": "opaque-token" }));

        let session = f.session.login(LoginRequest::new("user", "pw")).await.unwrap();
        assert!(!session.is_moderator);
        assert_eq!(session.user_id, None);
        assert!(f.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_failure_messages() {
        let f = fixture();
        f.network
            .on("POST", "/api/login", 401, json!({ "message": "Неверный пароль" }))
            .on("POST", "/api/login", 500, json!({}));

        assert!(f.session.login(LoginRequest::new("u", "bad")).await.is_err());
        assert_eq!(f.session.snapshot().await.error.as_deref(), Some("Неверный пароль"));

        let err = f.session.login(LoginRequest::new("u", "bad")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(f.session.snapshot().await.error.as_deref(), Some(LOGIN_FAILED));
        assert!(!f.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_missing_access_token_is_an_error() {
        let f = fixture();
        f.network.on("POST", "/api/login", 200, json!({ "token_type": "bearer" }));

        assert!(f.session.login(LoginRequest::new("u", "pw")).await.is_err());
        assert!(f.storage.is_empty());
    }

    #[tokio::test]
    async fn test_register_never_requests_moderator() {
        let f = fixture();
        f.network.on("POST", "/api/register", 200, json!({ "message": "created" }));

        f.session.register("new", "pw").await.unwrap();
        let state = f.session.snapshot().await;
        assert!(!state.is_authenticated());
        assert_eq!(state.message.as_deref(), Some("created"));
        assert_eq!(
            f.network.requests()[0].body,
            Some(json!({ "login": "new", "password": "pw", "isModerator": false }))
        );
    }

    #[tokio::test]
    async fn test_logout_clears_state_when_server_fails() {
        let f = fixture();
        f.network
            .on("POST", "/api/login", 200, json!({ "access_token": "a.b.c" }))
            .on("GET", "/api/bidUPS", 200, json!({ "data": { "bid_id": 3, "items_count": 1 } }))
            .fail("GET", "/api/bidUPS/3")
            .fail("DELETE", "/api/bidUPS/3")
            .fail("POST", "/api/logout");

        f.session.login(LoginRequest::new("u", "pw")).await.unwrap();
        f.cart.fetch_cart().await.unwrap();
        f.search.set_search_value("ИБП").await;

        tokio_test::assert_ok!(f.session.logout().await);

        assert_eq!(f.session.snapshot().await, SessionState::default());
        assert_eq!(f.cart.snapshot().await.bid_id, None);
        assert!(f.search.snapshot().await.search_value.is_empty());
        assert!(f.storage.is_empty());

        let before = f.network.request_count();
        assert!(f.cart.fetch_cart().await.unwrap_err().is_not_authenticated());
        assert_eq!(f.network.request_count(), before);
    }

    #[tokio::test]
    async fn test_logout_deletes_draft_then_ends_session() {
        let f = fixture();
        f.network
            .on("POST", "/api/login", 200, json!({ "access_token": "a.b.c" }))
            .on("GET", "/api/bidUPS", 200, json!({ "data": { "bid_id": 3, "items_count": 1 } }))
            .on("GET", "/api/bidUPS/3", 200, json!({ "data": { "id": 3, "components": [{ "id": 8 }] } }))
            .on("DELETE", "/api/calcUPS", 200, json!({}))
            .on("DELETE", "/api/bidUPS/3", 200, json!({}))
            .on("POST", "/api/logout", 200, json!({}));

        f.session.login(LoginRequest::new("u", "pw")).await.unwrap();
        f.cart.fetch_cart().await.unwrap();
        f.session.logout().await.unwrap();

        let calls = f.network.calls();
        assert_eq!(
            calls[2..].to_vec(),
            vec![
                "GET /api/bidUPS/3",
                "DELETE /api/calcUPS",
                "DELETE /api/bidUPS/3",
                "POST /api/logout"
            ]
        );
    }

    #[tokio::test]
    async fn test_update_profile_requires_token() {
        let f = fixture();
        let update = ProfileUpdate {
            user_id: 1,
            new_login: Some("x".to_string()),
            new_password: None,
            current_password: "pw".to_string(),
        };

        assert!(f.session.update_profile(update).await.unwrap_err().is_not_authenticated());
        assert_eq!(f.network.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_profile_renames_user() {
        let f = fixture();
        f.network
            .on("POST", "/api/login", 200, json!({ "access_token": "a.b.c" }))
            .on("PUT", "/api/users/4", 200, json!({}));

        f.session.login(LoginRequest::new("old", "pw")).await.unwrap();
        f.session
            .update_profile(ProfileUpdate {
                user_id: 4,
                new_login: Some("new".to_string()),
                new_password: None,
                current_password: "pw".to_string(),
            })
            .await
            .unwrap();

        let state = f.session.snapshot().await;
        assert_eq!(state.username(), Some("new"));
        assert_eq!(state.message.as_deref(), Some(PROFILE_UPDATED));
        assert_eq!(
            f.network.requests()[1].body,
            Some(json!({ "login": "new", "password": "pw", "old_password": "pw" }))
        );
    }

    #[tokio::test]
    async fn test_restore_and_corrupt_entry() {
        let f = fixture();
        let stored = Session {
            username: "u".to_string(),
            token: "tok".to_string(),
            user_id: Some(2),
            is_moderator: false,
        };
        f.storage
            .set(SESSION_KEY, &serde_json::to_vec(&stored).unwrap())
            .await
            .unwrap();

        assert!(f.session.restore().await.unwrap());
        assert_eq!(f.session.snapshot().await.session, Some(stored));

        let fresh = fixture();
        fresh.storage.set(SESSION_KEY, b"{not json").await.unwrap();
        assert!(!fresh.session.restore().await.unwrap());
        assert!(fresh.storage.is_empty());
    }

    #[tokio::test]
    async fn test_debug_output_omits_token() {
        let f = fixture();
        f.session.client.set_token(Some("secret-token".to_string()));

        let printed = format!("{:?}", f.session);
        assert!(printed.starts_with("SessionStore"));
        assert!(printed.contains("authenticated: true"));
        assert!(!printed.contains("secret-token"));
    }
}
