//! Integration tests: the guard following live auth transitions.

use std::sync::Arc;

use coregate_guard::{GuardWatcher, Navigator, View};
use coregate_model::{AuthState, Route};
use coregate_provider::{IdentityProvider, MockProvider};
use coregate_session::{EventBridge, SessionStore};

struct Harness {
    provider: MockProvider,
    store: Arc<SessionStore>,
    _bridge: EventBridge,
}

fn harness(provider: MockProvider) -> Harness {
    let store = Arc::new(SessionStore::default());
    let bridge = EventBridge::attach(&provider, &store);
    Harness {
        provider,
        store,
        _bridge: bridge,
    }
}

/// Waits until the watcher publishes `expected`.
async fn settle(watcher: &GuardWatcher, expected: View) {
    let mut views = watcher.views();
    views
        .wait_for(|view| *view == expected)
        .await
        .expect("watcher alive");
}

#[tokio::test]
async fn test_nothing_renders_until_lookup_resolves() {
    let h = harness(MockProvider::new());
    let watcher = GuardWatcher::attach(&h.store, Navigator::new("/dashboard"));

    assert_eq!(watcher.view(), View::Blank);
    assert_eq!(watcher.navigate("/login"), Ok(View::Blank));

    h.store.initialize(&h.provider).await;

    assert_eq!(watcher.view(), View::Page(Route::Login));
}

#[tokio::test]
async fn test_cold_start_with_session_renders_dashboard() {
    let provider = MockProvider::new();
    provider.restore_session("ada@example.com");
    let h = harness(provider);
    let watcher = GuardWatcher::attach(&h.store, Navigator::new("/"));

    h.store.initialize(&h.provider).await;

    assert_eq!(watcher.view(), View::Page(Route::Dashboard));
    assert_eq!(watcher.history(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn test_sign_in_then_sign_out_round_trip() {
    let h = harness(MockProvider::new().with_account("ada@example.com", "pw"));
    let watcher = GuardWatcher::attach(&h.store, Navigator::new("/"));
    h.store.initialize(&h.provider).await;
    assert_eq!(watcher.current_route(), Route::Login);

    h.provider
        .sign_in_with_password("ada@example.com", "pw")
        .await
        .unwrap();
    h.store.changes().wait_for(AuthState::is_authenticated).await.unwrap();
    assert_eq!(watcher.navigate("/dashboard"), Ok(View::Page(Route::Dashboard)));

    h.provider.sign_out().await.unwrap();
    settle(&watcher, View::Page(Route::Login)).await;

    assert_eq!(watcher.current_route(), Route::Login);
    assert_eq!(h.store.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_token_refresh_keeps_dashboard() {
    let provider = MockProvider::new();
    provider.restore_session("ada@example.com");
    let h = harness(provider);
    let watcher = GuardWatcher::attach(&h.store, Navigator::new("/dashboard"));
    h.store.initialize(&h.provider).await;

    let refreshed = h.provider.refresh_session().unwrap();
    h.store
        .changes()
        .wait_for(|s| s.session() == Some(&refreshed))
        .await
        .unwrap();

    assert_eq!(watcher.view(), View::Page(Route::Dashboard));
}

#[tokio::test]
async fn test_drop_unregisters_observer() {
    let h = harness(MockProvider::new());
    let watcher = GuardWatcher::attach(&h.store, Navigator::default());
    assert_eq!(h.store.observer_count(), 1);

    drop(watcher);

    assert_eq!(h.store.observer_count(), 0);
}
