//! Credential flows for Coregate.
//!
//! A [`CredentialForm`] drives one form interaction against the identity
//! provider: validate, submit, and record the outcome as a
//! [`SubmissionState`](coregate_model::SubmissionState) the UI can render.
//! [`LoginForm`] layers the sign-in / sign-up toggle of the login page on
//! top.
//!
//! The flows never touch the session store. A successful sign-in makes
//! the provider emit `SignedIn`, and the event bridge takes it from there.
//!
//! # Key types
//!
//! - [`CredentialForm`]: sign-in, sign-up and password reset
//! - [`LoginForm`] / [`FormMode`]: the login page's mode toggle
//! - [`FlowConfig`]: application origin and reset landing path
//! - [`FlowError`] / [`ValidationError`]: why a submission did not run

mod config;
mod error;
mod form;
mod login;

pub use config::FlowConfig;
pub use error::{FlowError, ValidationError};
pub use form::{CredentialForm, SignInOutcome};
pub use login::{FormMode, LoginForm, LoginOutcome};
