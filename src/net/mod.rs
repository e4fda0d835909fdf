//! Identity-service plumbing: wire DTOs, the token holder, and the HTTP client.
//!
//! DESIGN
//! ======
//! The session store only sees the `TokenStore` and `IdentityApi` traits;
//! the concrete reqwest client and the file/memory holders live here so tests
//! can swap either side independently.

pub mod api;
pub mod token;
pub mod types;
