//! # Coregate
//!
//! Client-side session management and access gating.
//!
//! Coregate keeps one authoritative [`AuthState`](coregate_model::AuthState)
//! in sync with an external identity provider, runs the sign-in, sign-up
//! and password-reset forms against that provider, and gates protected
//! routes on the result. Identity itself (credentials, tokens, email
//! delivery) stays with the provider.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coregate::prelude::*;
//!
//! # async fn run() -> Result<(), CoregateError> {
//! let provider = MockProvider::new().with_account("ada@example.com", "hunter22");
//! let context = AuthContext::<MockProvider>::builder().build(provider)?;
//! context.start().await;
//!
//! let page = context.navigator("/");
//! assert_eq!(page.current_route(), Route::Login);
//!
//! context.login_form().submit("ada@example.com", "hunter22").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - `coregate-model`: sessions, auth state, routes, profile
//! - `coregate-provider`: the identity provider trait and implementations
//! - `coregate-session`: the session store and event bridge
//! - `coregate-flow`: credential forms
//! - `coregate-guard`: route guard and navigation

mod config;
mod context;
mod error;
mod profile;

pub use config::ContextConfig;
pub use context::{AuthContext, AuthContextBuilder};
pub use error::{ConfigError, CoregateError};
pub use profile::{ProfileClient, ProfileError, ProfileSlot};

/// Everything an application typically needs, in one import.
pub mod prelude {
    pub use crate::{
        AuthContext, AuthContextBuilder, ConfigError, ContextConfig, CoregateError,
        ProfileClient, ProfileError, ProfileSlot,
    };
    pub use coregate_flow::{
        CredentialForm, FlowConfig, FlowError, FormMode, LoginForm, LoginOutcome,
        SignInOutcome, ValidationError,
    };
    pub use coregate_guard::{GuardDecision, GuardWatcher, NavigationError, Navigator, View, evaluate};
    pub use coregate_model::{
        AuthState, Profile, ProviderEvent, Route, Session, SubmissionState, User,
    };
    #[cfg(feature = "mock")]
    pub use coregate_provider::{MockOperation, MockProvider};
    #[cfg(feature = "supabase")]
    pub use coregate_provider::{SupabaseConfig, SupabaseProvider};
    pub use coregate_provider::{IdentityProvider, ProviderError, Subscription};
    pub use coregate_session::{EventBridge, SessionStore, StoreConfig};
}
