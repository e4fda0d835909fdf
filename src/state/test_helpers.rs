//! Mock identity service and fixtures shared by state tests.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::net::api::{ApiError, IdentityApi};
use crate::net::token::{MemoryTokenStore, TokenStore};
use crate::net::types::{LoginResponse, Role, User};

use super::auth::SessionStore;

/// Profile returned by a successful token resolution.
pub fn dana() -> User {
    User {
        id: "u-1".to_owned(),
        name: "Dana Fleet".to_owned(),
        email: "dana@example.com".to_owned(),
        role: Role::Manager,
        avatar_url: None,
    }
}

/// Profile returned by a successful login.
pub fn sam() -> User {
    User {
        id: "u-2".to_owned(),
        name: "Sam Driver".to_owned(),
        email: "a@b.com".to_owned(),
        role: Role::Driver,
        avatar_url: Some("https://cdn.example.com/sam.png".to_owned()),
    }
}

/// Scriptable `IdentityApi`. Login accepts only the password `"good"`.
pub struct MockIdentityApi {
    me: Result<User, ApiError>,
    logout: Result<(), ApiError>,
    gate: Option<Arc<Notify>>,
    panic_on_me: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl MockIdentityApi {
    pub fn new() -> Self {
        Self { me: Ok(dana()), logout: Ok(()), gate: None, panic_on_me: false, calls: Mutex::new(Vec::new()) }
    }

    pub fn rejecting_tokens(mut self, err: ApiError) -> Self {
        self.me = Err(err);
        self
    }

    pub fn failing_logout(mut self, err: ApiError) -> Self {
        self.logout = Err(err);
        self
    }

    /// Hold `get_me` until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_me = true;
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

impl Default for MockIdentityApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityApi for MockIdentityApi {
    async fn get_me(&self, _token: &str) -> Result<User, ApiError> {
        self.record("get_me");
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        assert!(!self.panic_on_me, "identity service exploded");
        self.me.clone()
    }

    async fn login(&self, _email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.record("login");
        if password == "good" {
            Ok(LoginResponse { user: sam(), token: "fresh".to_owned() })
        } else {
            Err(ApiError::InvalidCredentials)
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout");
        self.logout.clone()
    }
}

/// A store wired to `api` and a memory token holder seeded with `token`.
pub fn store_with(api: MockIdentityApi, token: Option<&str>) -> (Arc<SessionStore>, Arc<MockIdentityApi>, Arc<MemoryTokenStore>) {
    let api = Arc::new(api);
    let tokens = Arc::new(token.map_or_else(MemoryTokenStore::new, MemoryTokenStore::with_token));
    let store = Arc::new(SessionStore::new(
        Arc::clone(&tokens) as Arc<dyn TokenStore>,
        Arc::clone(&api) as Arc<dyn IdentityApi>,
    ));
    (store, api, tokens)
}
