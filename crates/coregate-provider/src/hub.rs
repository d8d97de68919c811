//! Fan-out of provider events to any number of subscribers.
//!
//! Every [`IdentityProvider`](crate::IdentityProvider) implementation owns an
//! [`EventHub`]. Subscribing hands back a [`Subscription`]: the receiving
//! end of an unbounded channel plus a weak handle to the hub. Dropping
//! (or explicitly unsubscribing) the `Subscription` removes its sender
//! from the hub, so no event is ever delivered to a torn-down listener.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use coregate_model::ProviderEvent;
use tokio::sync::mpsc;

/// Opaque identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: Vec<(SubscriptionId, mpsc::UnboundedSender<ProviderEvent>)>,
}

fn lock(inner: &Mutex<HubInner>) -> MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of live subscriptions.
///
/// Cloning an `EventHub` yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<HubInner>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new listener.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = lock(&self.inner);
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.listeners.push((id, tx));
        tracing::debug!(%id, "provider subscription opened");

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `event` to every live listener, in subscription order.
    ///
    /// Returns how many listeners received it.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let mut inner = lock(&self.inner);
        // A receiver that vanished without running Drop (leaked) is pruned here.
        inner.listeners.retain(|(_, tx)| !tx.is_closed());
        for (_, tx) in &inner.listeners {
            let _ = tx.send(event.clone());
        }
        let delivered = inner.listeners.len();
        tracing::debug!(event = event.kind(), delivered, "provider event emitted");
        delivered
    }

    /// Number of subscriptions currently registered.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A live registration with an [`EventHub`].
///
/// Events arrive in emission order. Dropping the subscription
/// unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<ProviderEvent>,
    hub: Weak<Mutex<HubInner>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the subscription has been removed from the hub
    /// (or the hub itself is gone) and every queued event was consumed.
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        self.rx.recv().await
    }

    /// Takes the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ProviderEvent> {
        self.rx.try_recv().ok()
    }

    /// Removes this subscription from its hub.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            lock(&hub).listeners.retain(|(id, _)| *id != self.id);
            tracing::debug!(id = %self.id, "provider subscription closed");
        }
    }
}
