//! Identity provider abstraction for Coregate.
//!
//! Coregate never issues or validates credentials itself. Everything it
//! knows about sessions comes from an external identity provider, reached
//! through the [`IdentityProvider`] trait. This crate defines that trait
//! and ships two implementations:
//!
//! - [`SupabaseProvider`]: talks to a Supabase (GoTrue) auth server over
//!   HTTPS.
//! - [`MockProvider`]: in-memory accounts with failure injection, for
//!   tests and demos.
//!
//! # Feature Flags
//!
//! - `mock` (default): the in-memory [`MockProvider`]
//! - `supabase` (default): the HTTP [`SupabaseProvider`] via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
mod hub;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "supabase")]
mod supabase;

pub use error::ProviderError;
pub use hub::{EventHub, Subscription, SubscriptionId};
#[cfg(feature = "mock")]
pub use mock::{CallLog, MockOperation, MockProvider};
#[cfg(feature = "supabase")]
pub use supabase::{SupabaseConfig, SupabaseProvider};

use std::future::Future;

use coregate_model::Session;
use url::Url;

/// The operations Coregate needs from an identity provider.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` lets one provider be shared (behind an `Arc`)
/// by the session store, the event bridge and every credential form,
/// across Tokio worker threads.
///
/// # Events
///
/// Implementations must emit a [`ProviderEvent`](coregate_model::ProviderEvent)
/// to every live [`Subscription`] whenever their current session changes:
/// `SignedIn` after a successful password sign-in, `SignedOut` after
/// sign-out, `TokenRefreshed` after a rotation. Coregate reacts to those
/// events, not to the return values of the calls below.
pub trait IdentityProvider: Send + Sync + 'static {
    /// The session the provider currently holds, if any.
    ///
    /// This is the "initial lookup" performed once at startup.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Session>, ProviderError>> + Send;

    /// Authenticates with email and password.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ProviderError>> + Send;

    /// Registers a new account. The provider is expected to require email
    /// verification, so no session results.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Ends the current session.
    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Sends a password-reset email whose link lands on `redirect_to`.
    fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &Url,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Opens a new event subscription. Dropping it unsubscribes.
    fn subscribe(&self) -> Subscription;
}
