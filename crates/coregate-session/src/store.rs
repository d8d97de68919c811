//! The session store: the single source of truth for [`AuthState`].
//!
//! # Writers
//!
//! Exactly two code paths write the state:
//!
//! - [`SessionStore::initialize`] resolves `Initializing` once, from the
//!   provider's initial lookup.
//! - [`EventBridge`](crate::EventBridge) applies every pushed provider
//!   event through the crate-private `replace`.
//!
//! # Ordering
//!
//! The initial lookup is asynchronous, so a provider event can land while
//! it is still in flight. Every `replace` bumps a generation counter; the
//! initializer remembers the generation it started from and drops its
//! result if a push happened meanwhile. The later-arriving push wins.
//!
//! # Locking
//!
//! Two std mutexes, always taken in this order:
//!
//! 1. `delivery` serializes whole transitions, so observers see them in
//!    the order they were applied.
//! 2. `inner` guards the state, generation and observer list. It is
//!    released before observers run, so an observer may call
//!    [`SessionStore::state`]. Observers must not write the store.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use coregate_model::{AuthState, ProviderEvent, Session};
use coregate_provider::IdentityProvider;
use tokio::sync::watch;

use crate::StoreConfig;

/// A synchronous state-change callback.
pub type Observer = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs-{}", self.0)
    }
}

struct StoreInner {
    state: AuthState,
    generation: u64,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the application's [`AuthState`].
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    delivery: Mutex<()>,
    init_started: AtomicBool,
    changes: watch::Sender<AuthState>,
    config: StoreConfig,
}

impl SessionStore {
    /// Creates a store in the `Initializing` state.
    pub fn new(config: StoreConfig) -> Self {
        let (changes, _) = watch::channel(AuthState::Initializing);
        Self {
            inner: Mutex::new(StoreInner {
                state: AuthState::Initializing,
                generation: 0,
                observers: Vec::new(),
                next_observer: 0,
            }),
            delivery: Mutex::new(()),
            init_started: AtomicBool::new(false),
            changes,
            config,
        }
    }

    /// The current state.
    pub fn state(&self) -> AuthState {
        lock(&self.inner).state.clone()
    }

    /// Number of `replace` calls applied so far.
    pub fn generation(&self) -> u64 {
        lock(&self.inner).generation
    }

    /// Registers `observer`, called synchronously after every transition.
    ///
    /// Observers run in registration order and are not called for the
    /// current value, only for changes.
    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        inner.next_observer += 1;
        let id = ObserverId(inner.next_observer);
        inner.observers.push((id, Arc::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    ///
    /// A transition already being delivered may still reach it.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut inner = lock(&self.inner);
        let before = inner.observers.len();
        inner.observers.retain(|(existing, _)| *existing != id);
        inner.observers.len() != before
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        lock(&self.inner).observers.len()
    }

    /// A receiver that sees every transition, for task-based consumers.
    pub fn changes(&self) -> watch::Receiver<AuthState> {
        self.changes.subscribe()
    }

    /// Waits until the state has left `Initializing` and returns it.
    pub async fn wait_until_resolved(&self) -> AuthState {
        let mut rx = self.changes.subscribe();
        match rx.wait_for(AuthState::is_resolved).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Performs the initial session lookup and resolves `Initializing`.
    ///
    /// Only the first call does anything; later calls return `false`
    /// without contacting the provider. The lookup result is discarded if
    /// a provider event was applied while it was in flight.
    ///
    /// Lookup failures and expired sessions resolve to `Unauthenticated`.
    /// If this future is dropped before the lookup completes, the store
    /// still resolves to `Unauthenticated` (unless an event already
    /// resolved it).
    pub async fn initialize<P: IdentityProvider>(&self, provider: &P) -> bool {
        if self.init_started.swap(true, Ordering::SeqCst) {
            tracing::debug!("session store already initialized");
            return false;
        }

        let generation = self.generation();
        let mut guard = InitGuard {
            store: self,
            generation,
            armed: true,
        };
        let looked_up = provider.current_session().await;
        guard.armed = false;

        let next = match looked_up {
            Ok(Some(session))
                if session.is_expired_within(Utc::now(), self.config.expiry_leeway()) =>
            {
                tracing::info!(user_id = %session.user.id, "stored session expired");
                AuthState::Unauthenticated
            }
            Ok(session) => AuthState::from_session(session),
            Err(err) => {
                tracing::warn!(error = %err, "initial session lookup failed");
                AuthState::Unauthenticated
            }
        };
        self.resolve_initial(next, generation);
        true
    }

    /// Applies a provider event.
    pub(crate) fn apply_event(&self, event: ProviderEvent) {
        tracing::debug!(event = event.kind(), "applying provider event");
        self.replace(event.into_session());
    }

    /// Sets the state from a pushed session (or its absence).
    ///
    /// Always bumps the generation, even when the value is unchanged, so a
    /// pending initial lookup knows it has been overtaken.
    pub(crate) fn replace(&self, session: Option<Session>) -> bool {
        let next = AuthState::from_session(session);
        self.transition(next, |inner| {
            inner.generation += 1;
            true
        })
    }

    /// Resolves `Initializing` from the initial lookup, unless a push got
    /// there first.
    fn resolve_initial(&self, next: AuthState, generation: u64) -> bool {
        self.transition(next, |inner| {
            if inner.generation != generation {
                tracing::debug!(
                    started = generation,
                    current = inner.generation,
                    "discarding stale initial lookup"
                );
                return false;
            }
            !inner.state.is_resolved()
        })
    }

    /// Runs one serialized transition. `admit` decides, under the state
    /// lock, whether `next` may be applied.
    fn transition<F>(&self, next: AuthState, admit: F) -> bool
    where
        F: FnOnce(&mut StoreInner) -> bool,
    {
        let _delivery = lock(&self.delivery);

        let (observers, generation) = {
            let mut inner = lock(&self.inner);
            if !admit(&mut *inner) {
                return false;
            }
            if inner.state == next {
                tracing::debug!(state = %next, "redundant auth state ignored");
                return false;
            }
            inner.state = next.clone();
            let observers: Vec<Observer> =
                inner.observers.iter().map(|(_, o)| Arc::clone(o)).collect();
            (observers, inner.generation)
        };

        tracing::info!(state = %next, generation, "auth state changed");
        self.changes.send_replace(next.clone());
        for observer in &observers {
            observer(&next);
        }
        true
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("SessionStore")
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

/// Resolves the store if `initialize` is dropped mid-lookup.
struct InitGuard<'a> {
    store: &'a SessionStore,
    generation: u64,
    armed: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("initial session lookup abandoned");
            self.store
                .resolve_initial(AuthState::Unauthenticated, self.generation);
        }
    }
}
