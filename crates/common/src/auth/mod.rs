//! Token lifecycle infrastructure
//!
//! This module owns everything about the access token the client carries:
//! where it is stored, how its claims are read, how it is renewed, and how
//! the application hears about session changes. It deliberately knows
//! nothing about HTTP request shapes; the request pipeline lives in the
//! infra crate and consumes these pieces through their traits.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  RefreshCoordinator  │  Single-flight renewal + waiter fan-out
//! └─────────┬────────────┘
//!           │
//!           ├──► RefreshTransport   (renewal call, seam for HTTP)
//!           ├──► TokenStore         (memory or file persistence)
//!           └──► SessionEvents      (token updated / removed / expired)
//!
//!    TokenClaims               Heuristic payload decode + expiry check
//! ```
//!
//! # Module Organization
//!
//! - **[`claims`]**: Access token claims (`TokenClaims`)
//! - **[`store`]**: Token persistence (`TokenStore`, `MemoryTokenStore`,
//!   `FileTokenStore`)
//! - **[`coordinator`]**: Single-flight renewal (`RefreshCoordinator`)
//! - **[`session`]**: Session event registry (`SessionEvents`)
//! - **[`error`]**: Error type shared by the above (`AuthError`)

pub mod claims;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod store;

// Re-export commonly used types and functions
pub use claims::TokenClaims;
pub use coordinator::{RefreshCoordinator, RefreshTransport};
pub use error::AuthError;
pub use session::{SessionEvent, SessionEvents, Subscription, SESSION_EXPIRED_MESSAGE};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
