//! # fleetdash
//!
//! Session layer for the fleet-management dashboard: the authentication
//! state store, its provider scope, and the identity-service client it talks
//! to.
//!
//! The `fleetctl` binary drives the same store from a terminal with a
//! file-backed token holder.

pub mod config;
pub mod net;
pub mod state;

pub use net::api::{ApiError, HttpIdentityApi, IdentityApi};
pub use net::token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use net::types::{Role, User};
pub use state::auth::{AuthView, Session, SessionStore};
pub use state::context::{ContextError, provide_auth, use_auth};
