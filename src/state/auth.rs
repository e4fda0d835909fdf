//! Session store: the single source of truth for "who is signed in".
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and user-aware views read `AuthView`; login forms call
//! `login` and render whatever `ApiError` comes back; the header calls
//! `logout`. Everything else observes changes through `subscribe`.
//!
//! LIFECYCLE
//! =========
//! A store starts pending (`initializing = true`). `activate` runs the first
//! `check_auth` exactly once; when it settles the store is either
//! authenticated or anonymous and never pending again.
//!
//! TRADE-OFFS
//! ==========
//! Overlapping `check_auth` calls are not coalesced: each one resolves
//! independently and the last write wins. After `unmount` all state writes
//! are dropped, but token-holder side effects (clearing a rejected token)
//! still happen.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::net::api::{ApiError, IdentityApi};
use crate::net::token::TokenStore;
use crate::net::types::User;

// =============================================================================
// SESSION
// =============================================================================

/// Observable authentication state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// The signed-in user, present iff authenticated.
    pub user: Option<User>,
    /// True from store creation until the first resolution settles.
    pub initializing: bool,
}

impl Session {
    #[must_use]
    pub fn pending() -> Self {
        Self { user: None, initializing: true }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// A fresh session is pending, not anonymous.
impl Default for Session {
    fn default() -> Self {
        Self::pending()
    }
}

/// UI-facing projection of [`Session`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthView {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl From<&Session> for AuthView {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user.clone(),
            is_authenticated: session.is_authenticated(),
            is_loading: session.initializing,
        }
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

pub struct SessionStore {
    tokens: Arc<dyn TokenStore>,
    api: Arc<dyn IdentityApi>,
    state: watch::Sender<Session>,
    activated: AtomicBool,
    unmounted: AtomicBool,
}

impl SessionStore {
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenStore>, api: Arc<dyn IdentityApi>) -> Self {
        let (state, _) = watch::channel(Session::pending());
        Self { tokens, api, state, activated: AtomicBool::new(false), unmounted: AtomicBool::new(false) }
    }

    /// Create a store and immediately activate it.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn mount(tokens: Arc<dyn TokenStore>, api: Arc<dyn IdentityApi>) -> Arc<Self> {
        let store = Arc::new(Self::new(tokens, api));
        let _initial = store.activate();
        store
    }

    /// Spawn the initial `check_auth`. Only the first call per store spawns;
    /// later calls return `None`.
    pub fn activate(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.activated.swap(true, Ordering::AcqRel) {
            tracing::debug!("session store already activated");
            return None;
        }
        let store = Arc::clone(self);
        Some(tokio::spawn(async move { store.check_auth().await }))
    }

    /// Resolve the stored token into a user. Never fails: any error lands the
    /// store in the anonymous state and clears the rejected token.
    pub async fn check_auth(&self) {
        let _settle = SettleOnDrop(self);

        let user = match self.tokens.get_token() {
            None => {
                tracing::debug!("no stored token; session is anonymous");
                None
            }
            Some(token) => match self.api.get_me(&token).await {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, role = %user.role, "session restored");
                    Some(user)
                }
                Err(e) => {
                    tracing::warn!(error = %e, code = e.error_code(), "token resolution failed; clearing token");
                    self.tokens.set_token(None);
                    None
                }
            },
        };
        self.settle_with(user);
    }

    /// Sign in with credentials. On failure the current user is left as is
    /// and the service error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`IdentityApi::login`] returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let resp = self.api.login(email, password).await.inspect_err(|e| {
            tracing::info!(error = %e, code = e.error_code(), "login failed");
        })?;
        tracing::info!(user_id = %resp.user.id, "login succeeded");
        self.set_user(Some(resp.user.clone()));
        Ok(resp.user)
    }

    /// Sign out. The local session always clears; a failed remote
    /// invalidation is logged and dropped.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, code = e.error_code(), "remote logout failed; clearing local session anyway");
        }
        self.set_user(None);
        tracing::info!("signed out");
    }

    // -------------------------------------------------------------------------
    // Readers
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn view(&self) -> AuthView {
        AuthView::from(&*self.state.borrow())
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().initializing
    }

    /// Watch every state change. The receiver starts at the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Wait until the initial resolution has settled.
    pub async fn wait_until_ready(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|session| !session.initializing).await;
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Mark the owning tree as gone. In-flight operations still finish, but
    /// their state writes are discarded.
    pub fn unmount(&self) {
        self.unmounted.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.unmounted.load(Ordering::Acquire)
    }

    // -------------------------------------------------------------------------
    // Writers
    // -------------------------------------------------------------------------

    fn update(&self, what: &'static str, modify: impl FnOnce(&mut Session) -> bool) {
        if self.is_unmounted() {
            tracing::debug!(update = what, "store unmounted; dropping state write");
            return;
        }
        self.state.send_if_modified(modify);
    }

    fn set_user(&self, user: Option<User>) {
        self.update("user", |session| {
            if session.user == user {
                return false;
            }
            session.user = user;
            true
        });
    }

    /// Publish the resolved user and clear `initializing` in one send, so
    /// readers never see a user while the store still looks pending.
    fn settle_with(&self, user: Option<User>) {
        self.update("resolution", |session| {
            let changed = session.initializing || session.user != user;
            session.user = user;
            session.initializing = false;
            changed
        });
    }

    fn settle(&self) {
        self.update("initializing", |session| std::mem::replace(&mut session.initializing, false));
    }
}

/// Clears `initializing` if `check_auth` panicked or was dropped mid-await.
/// On a normal return `settle_with` has already cleared it.
struct SettleOnDrop<'a>(&'a SessionStore);

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.settle();
    }
}
