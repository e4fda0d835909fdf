//! Token holder: where the opaque session credential lives between runs.
//!
//! ERROR HANDLING
//! ==============
//! Reads and writes never fail from the caller's point of view. The file
//! holder logs I/O problems and degrades to "no token", which routes the
//! session store to the anonymous state instead of surfacing an error.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Persists and retrieves the current session token.
pub trait TokenStore: Send + Sync {
    /// Return the stored token, or `None` when absent.
    fn get_token(&self) -> Option<String>;

    /// Store a token, or clear it with `None`.
    fn set_token(&self, token: Option<String>);
}

/// In-process token holder. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

/// File-backed token holder, one token per file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    fn remove(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                (!token.is_empty()).then(|| token.to_owned())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "token file unreadable; treating as absent");
                None
            }
        }
    }

    fn set_token(&self, token: Option<String>) {
        let result = match token.as_deref() {
            Some(token) => self.write(token),
            None => self.remove(),
        };
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "token file update failed");
        }
    }
}
