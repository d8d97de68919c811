//! Integration tests: provider events flowing through the bridge into the
//! store, including the race between the initial lookup and a push.

use std::sync::{Arc, Mutex};

use coregate_model::{AuthState, ProviderEvent};
use coregate_provider::{IdentityProvider, MockProvider};
use coregate_session::{EventBridge, SessionStore};

/// Waits for the store to reach a state matching `pred`.
async fn settle(store: &SessionStore, pred: impl Fn(&AuthState) -> bool) -> AuthState {
    let mut rx = store.changes();
    let state = rx.wait_for(|s| pred(s)).await.expect("store alive");
    state.clone()
}

#[tokio::test]
async fn test_sign_in_event_authenticates_store() {
    let provider = MockProvider::new().with_account("ada@example.com", "pw");
    let store = Arc::new(SessionStore::default());
    let _bridge = EventBridge::attach(&provider, &store);
    store.initialize(&provider).await;
    assert_eq!(store.state(), AuthState::Unauthenticated);

    let session = provider
        .sign_in_with_password("ada@example.com", "pw")
        .await
        .expect("sign-in should succeed");

    let state = settle(&store, AuthState::is_authenticated).await;
    assert_eq!(state, AuthState::Authenticated(session));
}

#[tokio::test]
async fn test_events_are_applied_in_emission_order() {
    let provider = MockProvider::new();
    let store = Arc::new(SessionStore::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |state| sink.lock().unwrap().push(state.to_string()));
    let bridge = EventBridge::attach(&provider, &store);

    provider.restore_session("ada@example.com");
    let first = provider.current().expect("restored");
    provider.emit(ProviderEvent::SignedIn(first));
    let refreshed = provider.refresh_session().expect("signed in");
    provider.emit(ProviderEvent::SignedOut);

    settle(&store, |s| *s == AuthState::Unauthenticated).await;
    bridge.shutdown().await;

    let user = refreshed.user.id;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            format!("Authenticated({user})"),
            format!("Authenticated({user})"),
            "Unauthenticated".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_redundant_sign_out_does_not_notify() {
    let provider = MockProvider::new();
    let store = Arc::new(SessionStore::default());
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    store.subscribe(move |_| *sink.lock().unwrap() += 1);
    let bridge = EventBridge::attach(&provider, &store);

    provider.emit(ProviderEvent::SignedOut);
    provider.emit(ProviderEvent::SignedOut);
    while store.generation() < 2 {
        tokio::task::yield_now().await;
    }
    bridge.shutdown().await;

    assert_eq!(*count.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_push_during_slow_lookup_wins() {
    let provider = Arc::new(MockProvider::new());
    provider.restore_session("ada@example.com");
    let release = provider.gate_lookup();
    let store = Arc::new(SessionStore::default());
    let _bridge = EventBridge::attach(&*provider, &store);

    let init = tokio::spawn({
        let store = Arc::clone(&store);
        let provider = Arc::clone(&provider);
        async move { store.initialize(&*provider).await }
    });
    while provider.calls().lookups == 0 {
        tokio::task::yield_now().await;
    }

    provider.sign_out().await.expect("sign-out should succeed");
    settle(&store, AuthState::is_resolved).await;
    let _ = release.send(());
    init.await.expect("init task");

    assert_eq!(store.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_dropping_bridge_releases_provider_registration() {
    let provider = MockProvider::new();
    let store = Arc::new(SessionStore::default());
    let bridge = EventBridge::attach(&provider, &store);
    assert_eq!(provider.listener_count(), 1);

    drop(bridge);
    // The aborted task drops its subscription once the runtime gets to it.
    while provider.listener_count() > 0 {
        tokio::task::yield_now().await;
    }

    provider.emit(ProviderEvent::SignedOut);
    tokio::task::yield_now().await;
    assert_eq!(store.state(), AuthState::Initializing);
}
