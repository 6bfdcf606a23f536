//! Error types for token storage and renewal

use thiserror::Error;

/// Error type for token storage and renewal operations
///
/// The type is `Clone` so that a single renewal outcome can be delivered
/// unchanged to every request waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No access token is stored (not authenticated)
    #[error("Not authenticated (no access token)")]
    NoToken,

    /// The stored token could not be decoded
    #[error("Token decode failed: {0}")]
    Decode(String),

    /// The renewal request was rejected or did not complete
    #[error("Token renewal failed: {0}")]
    Refresh(String),

    /// Token storage failed
    #[error("Token storage error: {0}")]
    Store(String),
}
