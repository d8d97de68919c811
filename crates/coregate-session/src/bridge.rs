//! Relays provider events into the session store.
//!
//! The bridge is a small background task:
//!
//! ```text
//! Provider ──(ProviderEvent)──→ Subscription ──→ relay task ──→ SessionStore::replace
//! ```
//!
//! The subscription is opened synchronously inside [`EventBridge::attach`],
//! so no event emitted after `attach` returns can be missed. The relay
//! keeps only a `Weak` handle to the store and exits once the store is
//! gone, the provider closes the subscription, or the bridge is shut down.

use std::sync::{Arc, Weak};

use coregate_provider::{IdentityProvider, Subscription};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::SessionStore;

/// Handle to a running relay task.
///
/// Dropping the handle aborts the relay, which drops the subscription and
/// with it the provider-side registration. Use [`shutdown`](Self::shutdown)
/// to wait for that to have happened.
#[derive(Debug)]
pub struct EventBridge {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl EventBridge {
    /// Subscribes to `provider` and starts relaying into `store`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach<P: IdentityProvider>(provider: &P, store: &Arc<SessionStore>) -> Self {
        let subscription = provider.subscribe();
        tracing::info!(subscription = %subscription.id(), "event bridge attached");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(relay(subscription, Arc::downgrade(store), shutdown_rx));

        Self {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Returns `true` while the relay task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the relay and waits until its subscription is released.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "event bridge task failed");
            }
        }
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn relay(
    mut subscription: Subscription,
    store: Weak<SessionStore>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                tracing::debug!("event bridge shutting down");
                break;
            }
            event = subscription.recv() => {
                let Some(event) = event else {
                    tracing::debug!("provider closed the subscription");
                    break;
                };
                let Some(store) = store.upgrade() else {
                    tracing::debug!("session store dropped, stopping bridge");
                    break;
                };
                store.apply_event(event);
            }
        }
    }
    tracing::info!(subscription = %subscription.id(), "event bridge detached");
}

#[cfg(test)]
mod tests {
    use coregate_model::{AuthState, ProviderEvent};
    use coregate_provider::MockProvider;

    use super::*;

    #[tokio::test]
    async fn test_attach_subscribes_immediately() {
        let provider = MockProvider::new();
        let store = Arc::new(SessionStore::default());

        let bridge = EventBridge::attach(&provider, &store);

        assert_eq!(provider.listener_count(), 1);
        assert!(bridge.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_releases_subscription() {
        let provider = MockProvider::new();
        let store = Arc::new(SessionStore::default());
        let bridge = EventBridge::attach(&provider, &store);

        bridge.shutdown().await;

        assert_eq!(provider.listener_count(), 0);
        assert_eq!(provider.emit(ProviderEvent::SignedOut), 0);
        assert_eq!(store.state(), AuthState::Initializing);
    }

    #[tokio::test]
    async fn test_relay_stops_when_store_dropped() {
        let provider = MockProvider::new();
        let store = Arc::new(SessionStore::default());
        let bridge = EventBridge::attach(&provider, &store);
        drop(store);

        provider.emit(ProviderEvent::SignedOut);
        while bridge.is_running() {
            tokio::task::yield_now().await;
        }

        assert_eq!(provider.listener_count(), 0);
    }
}
