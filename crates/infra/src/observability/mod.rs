//! Tracing initialization for SourceDeck binaries
//!
//! Installs a `tracing_subscriber` fmt layer with an environment-driven
//! filter. The filter is read from `SOURCEDECK_LOG` (standard `EnvFilter`
//! syntax) and falls back to `info` when the variable is absent or invalid.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "SOURCEDECK_LOG";

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; subsequent calls are no-ops because the
/// global subscriber can only be set once per process.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}
