//! # SourceDeck Infrastructure
//!
//! Infrastructure implementations behind the SourceDeck dashboard.
//!
//! This crate contains:
//! - The authenticated API client and its request pipeline
//! - The low-level HTTP client with bounded retry
//! - The HTTP-backed token renewal transport
//! - Configuration loading (environment and file)
//! - Tracing initialization
//!
//! ## Architecture
//! - Implements traits defined in `sourcedeck-common` (token renewal)
//! - Depends on `sourcedeck-domain` and `sourcedeck-common`
//! - Contains all "impure" code (network I/O, environment, filesystem)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory, ApiRequest};
pub use api::{HttpRefreshTransport, INVALID_SESSION_MESSAGE, REFRESH_TOKEN_PATH};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
