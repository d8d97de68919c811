//! `AuthContext`: the application's single auth entry point.
//!
//! It ties the layers together:
//!
//! ```text
//! IdentityProvider ──events──→ EventBridge ──→ SessionStore ──→ GuardWatcher
//!        ↑                                          │
//!   CredentialForm / LoginForm              ProfileClient (per access token)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coregate_flow::{CredentialForm, FlowConfig, LoginForm};
use coregate_guard::{GuardWatcher, Navigator};
use coregate_model::{AuthState, Session, User};
use coregate_provider::IdentityProvider;
use coregate_session::{EventBridge, SessionStore, StoreConfig};
use url::Url;

use crate::{ContextConfig, CoregateError, ProfileClient, ProfileSlot};

/// Builder for an [`AuthContext`].
///
/// # Example
///
/// ```rust,no_run
/// use coregate::prelude::*;
///
/// # async fn run() -> Result<(), CoregateError> {
/// let context = AuthContext::<MockProvider>::builder()
///     .config(ContextConfig::from_env()?)
///     .build(MockProvider::new())?;
/// let state = context.start().await;
/// println!("{state}");
/// # Ok(())
/// # }
/// ```
pub struct AuthContextBuilder {
    config: ContextConfig,
}

impl AuthContextBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the application origin used for password-reset links.
    pub fn origin(mut self, origin: Url) -> Self {
        self.config.origin = origin;
        self
    }

    /// Sets the backend base URL used for profile reads.
    pub fn backend_url(mut self, backend_url: Url) -> Self {
        self.config.backend_url = backend_url;
        self
    }

    /// Sets the session store configuration.
    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.config.store = config;
        self
    }

    /// Builds the context and attaches the event bridge.
    ///
    /// Must be called from within a Tokio runtime. The store stays
    /// `Initializing` until [`AuthContext::start`] runs.
    pub fn build<P: IdentityProvider>(self, provider: P) -> Result<AuthContext<P>, CoregateError> {
        let provider = Arc::new(provider);
        let store = Arc::new(SessionStore::new(self.config.store.clone()));
        let profile_client =
            ProfileClient::new(&self.config.backend_url, self.config.request_timeout)?;
        let bridge = EventBridge::attach(&*provider, &store);

        tracing::info!(
            origin = %self.config.origin,
            backend = %self.config.backend_url,
            "auth context ready"
        );

        Ok(AuthContext {
            flow: self.config.flow_config(),
            provider,
            store,
            bridge: Mutex::new(Some(bridge)),
            profile_client,
            profile: tokio::sync::Mutex::new(None),
        })
    }
}

impl Default for AuthContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Profile slot cached for one access token.
struct CachedProfile {
    access_token: String,
    slot: ProfileSlot,
}

/// Owns the provider, the session store and its event bridge, and hands
/// out forms and navigators bound to them.
pub struct AuthContext<P> {
    provider: Arc<P>,
    store: Arc<SessionStore>,
    bridge: Mutex<Option<EventBridge>>,
    profile_client: ProfileClient,
    profile: tokio::sync::Mutex<Option<CachedProfile>>,
    flow: FlowConfig,
}

impl<P: IdentityProvider> AuthContext<P> {
    /// Creates a new builder.
    pub fn builder() -> AuthContextBuilder {
        AuthContextBuilder::new()
    }

    /// Runs the initial session lookup and returns the resolved state.
    ///
    /// Safe to call more than once; only the first call contacts the
    /// provider.
    pub async fn start(&self) -> AuthState {
        self.store.initialize(&*self.provider).await;
        self.store.wait_until_resolved().await
    }

    pub fn state(&self) -> AuthState {
        self.store.state()
    }

    /// `true` until the initial lookup has resolved.
    pub fn is_loading(&self) -> bool {
        !self.store.state().is_resolved()
    }

    pub fn session(&self) -> Option<Session> {
        self.store.state().session().cloned()
    }

    pub fn user(&self) -> Option<User> {
        self.store.state().user().cloned()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Signs out through the provider.
    ///
    /// The store becomes `Unauthenticated` when the provider's `SignedOut`
    /// event arrives, not when this returns. Failures are logged and
    /// returned; the auth state is left to the provider's events.
    pub async fn sign_out(&self) -> Result<(), CoregateError> {
        match self.provider.sign_out().await {
            Ok(()) => {
                tracing::info!("signed out");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "sign-out failed");
                Err(err.into())
            }
        }
    }

    /// A fresh credential form.
    pub fn credential_form(&self) -> CredentialForm<P> {
        CredentialForm::new(Arc::clone(&self.provider), self.flow.clone())
    }

    /// A fresh login page form, in sign-in mode.
    pub fn login_form(&self) -> LoginForm<P> {
        LoginForm::new(self.credential_form())
    }

    /// A guarded navigator starting at `path`, kept in sync with the store.
    pub fn navigator(&self, path: &str) -> GuardWatcher {
        GuardWatcher::attach(&self.store, Navigator::new(path))
    }

    pub fn profile_client(&self) -> &ProfileClient {
        &self.profile_client
    }

    /// Loads the profile for the current session, once per access token.
    ///
    /// Returns `Unavailable` when nobody is signed in or the backend could
    /// not provide a profile.
    pub async fn load_profile(&self) -> ProfileSlot {
        let Some(session) = self.session() else {
            return ProfileSlot::Unavailable;
        };

        let mut cached = self.profile.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.access_token == session.access_token {
                return entry.slot.clone();
            }
        }

        let slot = match self.profile_client.fetch(&session).await {
            Some(profile) => ProfileSlot::Loaded(profile),
            None => ProfileSlot::Unavailable,
        };
        *cached = Some(CachedProfile {
            access_token: session.access_token,
            slot: slot.clone(),
        });
        slot
    }

    /// The profile slot for the current session without waiting.
    ///
    /// `Loading` while no result exists yet for the current access token
    /// (including while a load is running).
    pub fn profile_slot(&self) -> ProfileSlot {
        let Some(session) = self.session() else {
            return ProfileSlot::Unavailable;
        };
        match self.profile.try_lock() {
            Ok(cached) => match cached.as_ref() {
                Some(entry) if entry.access_token == session.access_token => entry.slot.clone(),
                _ => ProfileSlot::Loading,
            },
            Err(_) => ProfileSlot::Loading,
        }
    }

    /// Detaches the event bridge. The store keeps its last state but no
    /// longer follows the provider.
    pub async fn shutdown(&self) {
        let bridge = lock(&self.bridge).take();
        if let Some(bridge) = bridge {
            bridge.shutdown().await;
            tracing::info!("auth context shut down");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
