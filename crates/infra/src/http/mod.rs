//! HTTP transport layer
//!
//! Retrying reqwest wrapper used by the API client and the token renewal
//! transport.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
