//! Single-flight token renewal
//!
//! Collapses concurrent renewal attempts into one backend call. The first
//! caller becomes the leader and performs the renewal; callers arriving
//! while it is in flight wait on a channel and receive the same outcome,
//! in arrival order. On success the new token is written through to the
//! store before anyone is released; on failure the stored token is cleared
//! and session events are emitted before the error fans out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::error::AuthError;
use super::session::{SessionEvent, SessionEvents, SESSION_EXPIRED_MESSAGE};
use super::store::TokenStore;

/// Transport seam for the renewal call itself
///
/// Kept separate from the general request pipeline so a renewal can never
/// recursively trigger another renewal.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchange the current access token for a renewed one
    ///
    /// # Errors
    /// Returns `AuthError::Refresh` if the backend rejects the renewal or
    /// the call does not complete.
    async fn renew(&self, current_token: &str) -> Result<String, AuthError>;
}

type Waiter = oneshot::Sender<Result<String, AuthError>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// Coordinates token renewal across concurrent requests
///
/// At most one renewal is in flight at any time. The internal lock is held
/// only to inspect or update bookkeeping, never across an await point.
pub struct RefreshCoordinator {
    transport: Arc<dyn RefreshTransport>,
    store: Arc<dyn TokenStore>,
    events: SessionEvents,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Create a coordinator over the given transport and store
    #[must_use]
    pub fn new(
        transport: Arc<dyn RefreshTransport>,
        store: Arc<dyn TokenStore>,
        events: SessionEvents,
    ) -> Self {
        Self { transport, store, events, state: Mutex::new(RefreshState::default()) }
    }

    /// Renew the access token, joining an in-flight renewal if one exists
    ///
    /// The returned token has already been written to the store. Waiters
    /// are settled in arrival order and all receive the same outcome.
    ///
    /// # Errors
    /// - `AuthError::NoToken` if no token is stored to renew
    /// - `AuthError::Refresh` if the backend rejects the renewal; the
    ///   stored token is cleared and session events fire before the error
    ///   is returned
    /// - `AuthError::Store` if the store cannot be read or written
    pub async fn refresh(&self) -> Result<String, AuthError> {
        let rx = {
            let mut state = self.lock_state();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = rx {
            debug!("Joining in-flight token renewal");
            return match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(AuthError::Refresh("renewal task dropped".to_string())),
            };
        }

        let outcome = self.renew_once().await;
        self.settle(&outcome);
        outcome
    }

    /// Whether a renewal is currently in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().in_flight
    }

    async fn renew_once(&self) -> Result<String, AuthError> {
        let current = match self.store.get_token().await? {
            Some(token) => token,
            None => {
                debug!("Renewal requested with no stored token");
                return Err(AuthError::NoToken);
            }
        };

        info!("Renewing access token");
        match self.transport.renew(&current).await {
            Ok(new_token) => {
                self.store.set_token(&new_token).await?;
                self.events.emit(&SessionEvent::TokenUpdated { token: new_token.clone() });
                info!("Access token renewed");
                Ok(new_token)
            }
            Err(e) => {
                error!(error = %e, "Token renewal failed; ending session");
                if let Err(store_err) = self.store.clear_token().await {
                    warn!(error = %store_err, "Failed to clear token after renewal failure");
                }
                self.events.emit(&SessionEvent::TokenRemoved);
                self.events.emit(&SessionEvent::SessionExpired {
                    message: SESSION_EXPIRED_MESSAGE.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Release every waiter with a copy of the leader's outcome.
    fn settle(&self, outcome: &Result<String, AuthError>) {
        let waiters = {
            let mut state = self.lock_state();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), "Settling token renewal");
        for waiter in waiters {
            // A waiter that gave up (dropped its receiver) is skipped.
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        // State stays consistent under poisoning: settle always runs.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}
