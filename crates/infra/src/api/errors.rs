//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata.

use std::time::Duration;

use sourcedeck_common::auth::AuthError;
use sourcedeck_domain::SourcedeckError;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401) - recoverable via token renewal
    Authentication,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Configuration errors - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::Authentication
                | ApiErrorCategory::RateLimit
                | ApiErrorCategory::Server
                | ApiErrorCategory::Network
        )
    }
}

impl From<SourcedeckError> for ApiError {
    fn from(err: SourcedeckError) -> Self {
        match err {
            SourcedeckError::Network(message) => Self::Network(message),
            SourcedeckError::Timeout(message) => Self::Network(message),
            SourcedeckError::Auth(message) => Self::Auth(message),
            SourcedeckError::Config(message) => Self::Config(message),
            SourcedeckError::NotFound(message) | SourcedeckError::InvalidInput(message) => {
                Self::Client(message)
            }
            SourcedeckError::Internal(message) => Self::Server(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NoToken | AuthError::Decode(_) | AuthError::Refresh(_) => {
                Self::Auth(err.to_string())
            }
            AuthError::Store(message) => Self::Server(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ApiError::Auth("test".to_string()).category(),
            ApiErrorCategory::Authentication
        );
        assert_eq!(
            ApiError::RateLimit("test".to_string()).category(),
            ApiErrorCategory::RateLimit
        );
        assert_eq!(
            ApiError::Server("test".to_string()).category(),
            ApiErrorCategory::Server
        );
        assert_eq!(
            ApiError::Network("test".to_string()).category(),
            ApiErrorCategory::Network
        );
    }

    #[test]
    fn test_should_retry() {
        assert!(ApiError::Auth("test".to_string()).should_retry());
        assert!(ApiError::RateLimit("test".to_string()).should_retry());
        assert!(ApiError::Server("test".to_string()).should_retry());
        assert!(ApiError::Network("test".to_string()).should_retry());
        assert!(!ApiError::Client("test".to_string()).should_retry());
        assert!(!ApiError::Config("test".to_string()).should_retry());
    }

    #[test]
    fn test_auth_error_conversion() {
        let converted: ApiError = AuthError::NoToken.into();
        assert!(matches!(converted, ApiError::Auth(_)));

        let converted: ApiError = AuthError::Refresh("rejected".to_string()).into();
        assert!(matches!(converted, ApiError::Auth(_)));

        let converted: ApiError = AuthError::Store("disk full".to_string()).into();
        assert!(matches!(converted, ApiError::Server(_)));
    }

    #[test]
    fn test_domain_error_conversion() {
        let converted: ApiError = SourcedeckError::Network("down".to_string()).into();
        assert!(matches!(converted, ApiError::Network(_)));

        let converted: ApiError = SourcedeckError::NotFound("missing".to_string()).into();
        assert!(matches!(converted, ApiError::Client(_)));
    }
}
