//! Client-side application state.
//!
//! DESIGN
//! ======
//! `auth` owns the session store itself; `context` makes one store reachable
//! from anywhere inside a provider scope without threading it through every
//! call.

pub mod auth;
pub mod context;

#[cfg(test)]
pub(crate) mod test_helpers;
