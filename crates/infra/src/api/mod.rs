//! Authenticated API surface for SourceDeck
//!
//! This module provides the HTTP-based API client the dashboard talks to
//! the backend through. It owns the request/response pipeline: bearer
//! attachment, proactive token renewal, the single 401-triggered resend,
//! and session-expiry notification.
//!
//! # Architecture
//!
//! - Uses [`crate::http::HttpClient`] (no direct reqwest in the pipeline)
//! - Token lifecycle delegated to `sourcedeck-common::auth`
//! - Renewal transport kept off the interception path so it can never
//!   recurse

pub mod client;
pub mod errors;
pub mod refresh;
pub mod request;

pub use client::{ApiClient, ApiClientBuilder, INVALID_SESSION_MESSAGE};
pub use errors::{ApiError, ApiErrorCategory};
pub use refresh::{HttpRefreshTransport, REFRESH_TOKEN_PATH};
pub use request::ApiRequest;
