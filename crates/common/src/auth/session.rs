//! Session event notifications
//!
//! Lets the application react to session lifecycle changes (token updated,
//! token removed, session expired) without the auth layer knowing anything
//! about UI concerns. Handlers are registered through
//! [`SessionEvents::subscribe`] and stay active until their [`Subscription`]
//! handle is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

/// Message delivered when the session can no longer be renewed
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Session lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new access token was stored
    TokenUpdated {
        /// The token now in effect
        token: String,
    },

    /// The stored access token was removed
    TokenRemoved,

    /// The session cannot be renewed; the user must sign in again
    SessionExpired {
        /// Human-readable explanation suitable for display
        message: String,
    },
}

type Handler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;
type HandlerList = Mutex<Vec<(u64, Handler)>>;

/// Registry of session event handlers
///
/// Cloning is cheap; all clones share the same handler list. Events are
/// delivered synchronously, in registration order, on the emitting task.
#[derive(Clone, Default)]
pub struct SessionEvents {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    handlers: HandlerList,
    next_id: AtomicU64,
}

impl SessionEvents {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for session events
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped. Multiple handlers may be active at once.
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn subscribe(&self, handler: impl Fn(&SessionEvent) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock_handlers().push((id, Arc::new(handler)));
        debug!(id, "Session event handler registered");

        Subscription { id, handlers: Arc::downgrade(&self.inner) }
    }

    /// Deliver an event to every registered handler
    pub fn emit(&self, event: &SessionEvent) {
        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<Handler> =
            self.lock_handlers().iter().map(|(_, h)| Arc::clone(h)).collect();

        debug!(handlers = handlers.len(), event = ?event, "Emitting session event");
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of active handlers
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.lock_handlers().len()
    }

    fn lock_handlers(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Handler)>> {
        self.inner.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEvents").field("handlers", &self.handler_count()).finish()
    }
}

/// Handle that keeps a session event handler registered
///
/// Dropping the handle unregisters the handler. An application that wants
/// a single active handler simply drops the previous handle when
/// registering a new one.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    handlers: Weak<Inner>,
}

impl Subscription {
    /// Unregister the handler now
    ///
    /// Equivalent to dropping the handle; provided for call sites where an
    /// explicit name reads better.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.handlers.upgrade() {
            let mut handlers = inner.handlers.lock().unwrap_or_else(PoisonError::into_inner);
            handlers.retain(|(id, _)| *id != self.id);
            debug!(id = self.id, "Session event handler unregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::session.
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Validates `SessionEvents::subscribe` behavior for the delivery
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms each registered handler observes the emitted event once.
    #[test]
    fn test_emit_reaches_all_handlers() {
        let events = SessionEvents::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_count = Arc::clone(&first);
        let _first_sub = events.subscribe(move |_| {
            first_count.fetch_add(1, Ordering::SeqCst);
        });

        let second_count = Arc::clone(&second);
        let _second_sub = events.subscribe(move |_| {
            second_count.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(&SessionEvent::TokenRemoved);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    /// Validates `Subscription` drop behavior.
    ///
    /// Assertions:
    /// - Confirms `events.handler_count()` equals `1` while subscribed.
    /// - Confirms `events.handler_count()` equals `0` after the handle drops.
    /// - Ensures a dropped handler no longer receives events.
    #[test]
    fn test_dropping_subscription_unregisters() {
        let events = SessionEvents::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_count = Arc::clone(&seen);
        let subscription = events.subscribe(move |_| {
            seen_count.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(events.handler_count(), 1);

        drop(subscription);
        assert_eq!(events.handler_count(), 0);

        events.emit(&SessionEvent::TokenRemoved);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    /// Validates `Subscription::unsubscribe` behavior.
    ///
    /// Assertions:
    /// - Confirms `events.handler_count()` equals `0` after unsubscribe.
    #[test]
    fn test_explicit_unsubscribe() {
        let events = SessionEvents::new();
        let subscription = events.subscribe(|_| {});

        subscription.unsubscribe();
        assert_eq!(events.handler_count(), 0);
    }

    /// Validates event payload delivery for the session expired scenario.
    ///
    /// Assertions:
    /// - Confirms the handler observes the expiry message verbatim.
    #[test]
    fn test_session_expired_carries_message() {
        let events = SessionEvents::new();
        let received = Arc::new(std::sync::Mutex::new(None));

        let received_clone = Arc::clone(&received);
        let _sub = events.subscribe(move |event| {
            if let SessionEvent::SessionExpired { message } = event {
                *received_clone.lock().unwrap() = Some(message.clone());
            }
        });

        events.emit(&SessionEvent::SessionExpired {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        });

        assert_eq!(received.lock().unwrap().as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    }

    /// Validates clone semantics for the shared registry scenario.
    ///
    /// Assertions:
    /// - Ensures a handler registered through one clone observes events
    ///   emitted through another.
    #[test]
    fn test_clones_share_handlers() {
        let events = SessionEvents::new();
        let emitter = events.clone();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_count = Arc::clone(&seen);
        let _sub = events.subscribe(move |_| {
            seen_count.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&SessionEvent::TokenRemoved);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
