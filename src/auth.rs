//! Credential storage.
//!
//! Session persistence behind an explicit injected interface, so the
//! surrounding shell can store tokens however it likes while the
//! aggregation core never touches them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A stored session: bearer token plus the user object returned at
/// login, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "auth_token")]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

/// Pluggable credential persistence.
pub trait CredentialStore {
    fn get(&self) -> Result<Option<Credentials>>;
    fn set(&self, credentials: &Credentials) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Credential store backed by a JSON file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `.fleetmon/credentials.json` under the home
    /// directory, falling back to the current directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fleetmon")
            .join("credentials.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials: {}", self.path.display()))?;

        match serde_json::from_str(&content) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e) => {
                // Corrupt file: treat as logged out and drop it.
                warn!("Stored credentials are unreadable ({}), clearing", e);
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn set(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create credentials directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write credentials: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove credentials: {}", self.path.display())
            })?;
        }
        Ok(())
    }
}

/// In-memory credential store for tests and embedding.
#[allow(dead_code)] // Exercised by tests
pub struct MemoryCredentialStore {
    credentials: std::cell::RefCell<Option<Credentials>>,
}

#[allow(dead_code)] // Exercised by tests
impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            credentials: std::cell::RefCell::new(None),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credentials>> {
        Ok(self.credentials.borrow().clone())
    }

    fn set(&self, credentials: &Credentials) -> Result<()> {
        *self.credentials.borrow_mut() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.credentials.borrow_mut() = None;
        Ok(())
    }
}
