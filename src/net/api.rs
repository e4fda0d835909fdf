//! Identity service client: token resolution, credential login, logout.
//!
//! DESIGN
//! ======
//! `IdentityApi` is the seam the session store depends on; `HttpIdentityApi`
//! is the reqwest implementation. The HTTP client owns token persistence:
//! a successful login writes the fresh token to the shared `TokenStore` and
//! logout clears it whether or not the server acknowledged.
//!
//! ERROR HANDLING
//! ==============
//! Status codes are mapped per endpoint. A 401 from `/auth/me` means the
//! stored token is dead (`Unauthorized`); the same status from `/auth/login`
//! means the credentials were rejected (`InvalidCredentials`).

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::token::TokenStore;
use super::types::{LoginRequest, LoginResponse, User};
use crate::config::ApiConfig;

const ME_PATH: &str = "/auth/me";
const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by identity service calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The token was rejected during resolution (expired, revoked, unknown).
    #[error("session token rejected")]
    Unauthorized,

    /// The email/password pair was rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request never produced an HTTP response.
    #[error("network failure: {0}")]
    Network(String),

    /// The service answered with an unexpected non-success status.
    #[error("identity service error: status {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Stable machine-readable code for UI display and logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::Network(_) => "E_NETWORK",
            Self::Server { .. } => "E_SERVER",
            Self::Decode(_) => "E_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Remote identity service consumed by the session store.
#[async_trait::async_trait]
pub trait IdentityApi: Send + Sync {
    /// Resolve a stored token to the user it belongs to.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] if the token is rejected, or a transport error.
    async fn get_me(&self, token: &str) -> Result<User, ApiError>;

    /// Exchange credentials for a profile and a fresh token.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidCredentials`] if rejected, or a transport error.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Invalidate the current session server-side.
    ///
    /// # Errors
    ///
    /// Returns a transport or server error; callers may ignore it.
    async fn logout(&self) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Me,
    Login,
    Logout,
}

/// `/auth/me` bodies come either bare or wrapped in `{"user": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeBody {
    Wrapped { user: User },
    Bare(User),
}

impl From<MeBody> for User {
    fn from(body: MeBody) -> Self {
        match body {
            MeBody::Wrapped { user } | MeBody::Bare(user) => user,
        }
    }
}

pub struct HttpIdentityApi {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpIdentityApi {
    /// Build a client for `config`, persisting tokens through `tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { client, base_url: config.base_url.clone(), tokens })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(endpoint: Endpoint, resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(endpoint, status.as_u16(), &body));
        }
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn logout_remote(&self, token: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.endpoint(LOGOUT_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(Endpoint::Logout, status.as_u16(), &body))
    }
}

#[async_trait::async_trait]
impl IdentityApi for HttpIdentityApi {
    async fn get_me(&self, token: &str) -> Result<User, ApiError> {
        let resp = self
            .client
            .get(self.endpoint(ME_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        let body: MeBody = Self::decode(Endpoint::Me, resp).await?;
        Ok(body.into())
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = LoginRequest { email: email.to_owned(), password: password.to_owned() };
        let resp = self
            .client
            .post(self.endpoint(LOGIN_PATH))
            .json(&request)
            .send()
            .await
            .map_err(network)?;
        let login: LoginResponse = Self::decode(Endpoint::Login, resp).await?;
        self.tokens.set_token(Some(login.token.clone()));
        Ok(login)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let result = match self.tokens.get_token() {
            Some(token) => self.logout_remote(&token).await,
            None => Ok(()),
        };
        self.tokens.set_token(None);
        result
    }
}

fn network(e: reqwest::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

fn classify_status(endpoint: Endpoint, status: u16, body: &str) -> ApiError {
    match (endpoint, status) {
        (Endpoint::Me | Endpoint::Logout, 401 | 403) => ApiError::Unauthorized,
        (Endpoint::Login, 400 | 401 | 403) => ApiError::InvalidCredentials,
        _ => ApiError::Server { status, message: error_message(body) },
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.message.or(parsed.error) {
            return msg;
        }
    }
    body.trim().to_owned()
}
