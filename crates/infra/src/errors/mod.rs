//! Infrastructure error handling
//!
//! Keeps conversions from third-party error types on the infrastructure
//! side, so the domain error stays free of external trait impls.

pub mod conversions;

pub use conversions::InfraError;
