//! Error types for the credential flows.

use coregate_provider::ProviderError;

/// A required form field was left empty.
///
/// The `Display` text is what the form shows inline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Email or password missing on sign-in / sign-up.
    #[error("Please enter your email and password")]
    MissingCredentials,

    /// Email missing on a password-reset request.
    #[error("Please enter your email address first")]
    MissingEmail,
}

/// Errors returned by [`CredentialForm`](crate::CredentialForm) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// Rejected before contacting the provider.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The provider refused the request. The message is already on the
    /// form's `SubmissionState`.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Another submission on the same form is still running.
    #[error("a submission is already in progress")]
    InFlight,

    /// The form was discarded; nothing was submitted.
    #[error("the form has been discarded")]
    Discarded,

    /// Password reset is only offered on the sign-in form.
    #[error("password reset is not available in sign-up mode")]
    NotOffered,
}

impl FlowError {
    /// The message to show the user, if this error has one.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(err) => Some(err.to_string()),
            Self::Provider(err) => Some(err.message()),
            Self::InFlight | Self::Discarded | Self::NotOffered => None,
        }
    }
}
