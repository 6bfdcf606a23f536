//! Token storage
//!
//! Persistence seam for the single opaque access token the client holds.
//! Two implementations are provided: an in-memory store for ephemeral
//! sessions and tests, and a file-backed store that keeps the token in a
//! small JSON document so it survives restarts.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::error::AuthError;

/// Storage seam for the current access token
///
/// Implementations must be safe to share across tasks. All operations are
/// idempotent: clearing an absent token succeeds.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Get the stored access token, if any
    ///
    /// # Errors
    /// Returns `AuthError::Store` if the backing storage cannot be read.
    async fn get_token(&self) -> Result<Option<String>, AuthError>;

    /// Replace the stored access token
    ///
    /// # Errors
    /// Returns `AuthError::Store` if the backing storage cannot be written.
    async fn set_token(&self, token: &str) -> Result<(), AuthError>;

    /// Remove the stored access token
    ///
    /// # Errors
    /// Returns `AuthError::Store` if the backing storage cannot be written.
    async fn clear_token(&self) -> Result<(), AuthError>;
}

/// In-memory token store
///
/// Holds the token for the lifetime of the process. Cloning is cheap and
/// all clones share the same token.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.token.read().await.clone())
    }

    async fn set_token(&self, token: &str) -> Result<(), AuthError> {
        *self.token.write().await = Some(token.to_string());
        debug!("Access token stored in memory");
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), AuthError> {
        *self.token.write().await = None;
        debug!("Access token cleared from memory");
        Ok(())
    }
}

/// On-disk document shape for [`FileTokenStore`]
#[derive(Debug, Serialize, Deserialize)]
struct TokenDocument {
    access_token: String,
}

/// File-backed token store
///
/// Persists the token as a JSON document at a caller-chosen path. A missing
/// file means no token is stored.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get_token(&self) -> Result<Option<String>, AuthError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::Store(format!(
                    "failed to read token document {}: {e}",
                    self.path.display()
                )))
            }
        };

        let document: TokenDocument = serde_json::from_str(&contents).map_err(|e| {
            AuthError::Store(format!("invalid token document {}: {e}", self.path.display()))
        })?;

        Ok(Some(document.access_token))
    }

    async fn set_token(&self, token: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AuthError::Store(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let document = TokenDocument { access_token: token.to_string() };
        let contents = serde_json::to_string(&document)
            .map_err(|e| AuthError::Store(format!("failed to encode token document: {e}")))?;

        tokio::fs::write(&self.path, contents).await.map_err(|e| {
            AuthError::Store(format!(
                "failed to write token document {}: {e}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), "Access token persisted");
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Access token document removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Store(format!(
                "failed to remove token document {}: {e}",
                self.path.display()
            ))),
        }
    }
}
