//! Provider scope for the session store.
//!
//! `provide_auth` makes a store reachable from any code running inside the
//! scoped future; `use_auth` fetches it. Calling `use_auth` outside a scope is
//! a wiring bug and fails immediately.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::future::Future;
use std::sync::Arc;

use super::auth::SessionStore;

tokio::task_local! {
    static AUTH: Arc<SessionStore>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("use_auth must be called within an auth provider scope")]
    MissingProvider,
}

/// Run `fut` with `store` provided to everything it awaits on this task.
pub async fn provide_auth<F>(store: Arc<SessionStore>, fut: F) -> F::Output
where
    F: Future,
{
    AUTH.scope(store, fut).await
}

/// Fetch the store provided by the enclosing [`provide_auth`] scope.
///
/// # Errors
///
/// Returns [`ContextError::MissingProvider`] when no scope is active.
/// Spawned tasks do not inherit the scope.
pub fn use_auth() -> Result<Arc<SessionStore>, ContextError> {
    AUTH.try_with(Arc::clone).map_err(|_| {
        tracing::error!("use_auth called outside an auth provider scope");
        ContextError::MissingProvider
    })
}
