//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Test mocks panic on poisoned mutexes to fail tests early
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{AuthError, RefreshTransport};

/// Shared call counter for mock transports
///
/// Cloning is cheap; all clones observe the same count. Grab a handle
/// before moving the mock into the object under test.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Number of calls recorded so far
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Mock renewal transport with scripted outcomes
///
/// Responses are consumed in the order they were pushed. When the script
/// runs dry the mock returns a generated `renewed-token-N` value, where N
/// is the call number. An optional delay keeps the renewal in flight long
/// enough for concurrency tests to observe it.
#[derive(Debug, Clone)]
pub struct MockRefreshTransport {
    responses: Arc<Mutex<VecDeque<Result<String, AuthError>>>>,
    calls: CallCounter,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockRefreshTransport {
    /// Create a mock transport with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: CallCounter::default(),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue the outcome of the next unscripted renewal call
    pub fn push_response(&self, response: Result<String, AuthError>) {
        self.responses.lock().expect("mutex poisoned").push_back(response);
    }

    /// Hold every renewal call open for the given duration before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("mutex poisoned") = Some(delay);
    }

    /// Handle onto the shared call counter
    #[must_use]
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }

    /// Number of renewal calls made so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.count()
    }
}

impl Default for MockRefreshTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTransport for MockRefreshTransport {
    async fn renew(&self, _current_token: &str) -> Result<String, AuthError> {
        let call_number = self.calls.increment();

        let delay = *self.delay.lock().expect("mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().expect("mutex poisoned").pop_front();
        scripted.unwrap_or_else(|| Ok(format!("renewed-token-{call_number}")))
    }
}
