//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl ApiTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Where and how to reach the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash, e.g. `https://fleet.example.com/api`.
    pub base_url: String,
    pub timeouts: ApiTimeouts,
}

impl ApiConfig {
    /// Build an API config for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the URL is not `http(s)://`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self { base_url: normalize_base_url(base_url)?, timeouts: ApiTimeouts::default() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    pub api: ApiConfig,
    /// File holding the session token. `None` keeps it in memory only.
    pub token_path: Option<PathBuf>,
}

impl FleetConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `FLEET_API_BASE_URL`: default `http://127.0.0.1:3000/api`
    /// - `FLEET_TOKEN_PATH`: token file; in-memory when absent
    /// - `FLEET_REQUEST_TIMEOUT_SECS`: default 30
    /// - `FLEET_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the base URL is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FleetConfig::from_env`] but reads values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the base URL is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("FLEET_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let token_path = lookup("FLEET_TOKEN_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let timeouts = ApiTimeouts {
            request_secs: parse_or(lookup("FLEET_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(lookup("FLEET_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api: ApiConfig { base_url: normalize_base_url(&base_url)?, timeouts }, token_path })
    }
}

fn parse_or(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::Parse(format!("base URL must start with http:// or https://: {raw}")))?;
    if host.is_empty() {
        return Err(ConfigError::Parse(format!("base URL has no host: {raw}")));
    }
    Ok(trimmed.to_owned())
}
