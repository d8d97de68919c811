//! Shared vocabulary for Coregate.
//!
//! This crate defines the data every other layer talks about:
//!
//! - **Identity** ([`Session`], [`User`]): what the identity provider
//!   hands us after a successful sign-in.
//! - **State** ([`AuthState`], [`SubmissionState`]): the two small state
//!   machines the rest of the workspace drives.
//! - **Events** ([`ProviderEvent`]): the change notifications pushed by
//!   the identity provider.
//! - **Routes** ([`Route`]): the client-side locations the guard decides
//!   about.
//! - **Profile** ([`Profile`]): the backend's view of the signed-in user.
//!
//! # Architecture
//!
//! The model layer has no behavior beyond small helpers. It doesn't know
//! about providers, stores, or HTTP. It only describes values.
//!
//! ```text
//! Provider (events) → Session store (AuthState) → Guard (Route decisions)
//! ```

mod event;
mod profile;
mod route;
mod session;
mod state;

pub use event::ProviderEvent;
pub use profile::Profile;
pub use route::Route;
pub use session::{Session, User};
pub use state::{AuthState, SubmissionState};
