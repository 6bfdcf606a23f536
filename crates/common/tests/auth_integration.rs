//! Integration tests for auth module
//!
//! Tests the concurrency behavior of single-flight token renewal: leader
//! election, waiter fan-out, failure propagation, and session events.

#![cfg(feature = "test-utils")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use sourcedeck_common::auth::{
    AuthError, MemoryTokenStore, RefreshCoordinator, SessionEvent, SessionEvents, TokenStore,
    SESSION_EXPIRED_MESSAGE,
};
use sourcedeck_common::testing::MockRefreshTransport;

fn build_coordinator(
    transport: MockRefreshTransport,
    store: Arc<MemoryTokenStore>,
) -> (Arc<RefreshCoordinator>, SessionEvents) {
    let events = SessionEvents::new();
    let coordinator =
        Arc::new(RefreshCoordinator::new(Arc::new(transport), store, events.clone()));
    (coordinator, events)
}

/// Validates that concurrent renewal attempts collapse into a single
/// backend call.
///
/// Requests that arrive while a renewal is in flight must not start their
/// own renewal; they wait for the in-flight one and receive the token it
/// produced. This is what keeps a burst of simultaneously-expiring requests
/// from stampeding the renewal endpoint.
///
/// # Test Steps
/// 1. Configure a transport that holds the renewal open for 200ms
/// 2. Start one renewal and give it time to take leadership
/// 3. Start five more renewals while the first is still in flight
/// 4. Verify every caller received the same token
/// 5. Verify the transport was called exactly once
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_renewals_collapse_to_one_call() {
    let transport = MockRefreshTransport::new();
    transport.set_delay(Duration::from_millis(200));
    transport.push_response(Ok("shared-token".to_string()));
    let calls = transport.calls();

    let store = Arc::new(MemoryTokenStore::with_token("stale-token"));
    let (coordinator, _events) = build_coordinator(transport, Arc::clone(&store));

    let leader = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.refresh().await })
    };

    // Let the leader take the in-flight slot before the others arrive
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(coordinator.is_refreshing());

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.refresh().await })
        })
        .collect();

    let leader_token = leader.await.unwrap().unwrap();
    assert_eq!(leader_token, "shared-token");

    for outcome in join_all(waiters).await {
        assert_eq!(outcome.unwrap().unwrap(), "shared-token");
    }

    assert_eq!(calls.count(), 1);
    assert_eq!(store.get_token().await.unwrap(), Some("shared-token".to_string()));
}

/// Validates that a renewal failure is delivered identically to every
/// waiting caller.
///
/// A failed renewal must not leave some callers hanging or hand different
/// errors to different callers: the leader's outcome is cloned to the whole
/// cohort, the stored token is cleared, and session events fire exactly
/// once rather than once per waiter.
///
/// # Test Steps
/// 1. Configure a transport that fails after holding the call open
/// 2. Start one renewal, then five more while it is in flight
/// 3. Verify every caller received the same `Refresh` error
/// 4. Verify the stored token was cleared
/// 5. Verify `TokenRemoved` and `SessionExpired` each fired exactly once
#[tokio::test(flavor = "multi_thread")]
async fn test_failure_fans_out_identically() {
    let transport = MockRefreshTransport::new();
    transport.set_delay(Duration::from_millis(200));
    transport.push_response(Err(AuthError::Refresh("renewal rejected".to_string())));
    let calls = transport.calls();

    let store = Arc::new(MemoryTokenStore::with_token("stale-token"));
    let (coordinator, events) = build_coordinator(transport, Arc::clone(&store));

    let observed = Arc::new(Mutex::new(Vec::new()));
    let observed_clone = Arc::clone(&observed);
    let _sub = events.subscribe(move |event| {
        observed_clone.lock().unwrap().push(event.clone());
    });

    let leader = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.refresh().await })
        })
        .collect();

    let expected = AuthError::Refresh("renewal rejected".to_string());
    assert_eq!(leader.await.unwrap(), Err(expected.clone()));
    for outcome in join_all(waiters).await {
        assert_eq!(outcome.unwrap(), Err(expected.clone()));
    }

    assert_eq!(calls.count(), 1);
    assert_eq!(store.get_token().await.unwrap(), None);

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 2);
    assert_eq!(observed[0], SessionEvent::TokenRemoved);
    assert!(matches!(&observed[1], SessionEvent::SessionExpired { message }
        if message == SESSION_EXPIRED_MESSAGE));
}

/// Validates that renewal without a stored token rejects without touching
/// the backend or the session.
///
/// There is nothing to renew, so the coordinator must reject immediately
/// with `NoToken`. No session events fire here: whether a missing token is
/// an error condition depends on the caller, and the caller is the one
/// with that context.
///
/// # Test Steps
/// 1. Build a coordinator over an empty store
/// 2. Run several concurrent renewals
/// 3. Verify each received `AuthError::NoToken`
/// 4. Verify the transport was never called and no events fired
#[tokio::test(flavor = "multi_thread")]
async fn test_no_token_rejects_without_side_effects() {
    let transport = MockRefreshTransport::new();
    let calls = transport.calls();
    let store = Arc::new(MemoryTokenStore::new());
    let (coordinator, events) = build_coordinator(transport, store);

    let observed = Arc::new(Mutex::new(Vec::new()));
    let observed_clone = Arc::clone(&observed);
    let _sub = events.subscribe(move |event: &SessionEvent| {
        observed_clone.lock().unwrap().push(event.clone());
    });

    let attempts: Vec<_> = (0..3)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.refresh().await })
        })
        .collect();

    for outcome in join_all(attempts).await {
        assert_eq!(outcome.unwrap(), Err(AuthError::NoToken));
    }

    assert_eq!(calls.count(), 0);
    assert!(observed.lock().unwrap().is_empty());
}

/// Validates that the in-flight slot is released once a renewal settles.
///
/// A renewal that has completed must not absorb later renewals: a second
/// burst gets its own backend call and its own outcome.
///
/// # Test Steps
/// 1. Run one renewal to completion
/// 2. Run a second renewal
/// 3. Verify the transport was called twice with distinct outcomes
#[tokio::test(flavor = "multi_thread")]
async fn test_sequential_renewals_each_hit_the_backend() {
    let transport = MockRefreshTransport::new();
    transport.push_response(Ok("token-one".to_string()));
    transport.push_response(Ok("token-two".to_string()));
    let calls = transport.calls();

    let store = Arc::new(MemoryTokenStore::with_token("original"));
    let (coordinator, _events) = build_coordinator(transport, store);

    assert_eq!(coordinator.refresh().await.unwrap(), "token-one");
    assert!(!coordinator.is_refreshing());
    assert_eq!(coordinator.refresh().await.unwrap(), "token-two");
    assert_eq!(calls.count(), 2);
}
