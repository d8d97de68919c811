//! The credential form controller.
//!
//! ```text
//!   Idle ──submit──→ Submitting ──provider ok──→ Succeeded(message)
//!                        │
//!                        └──provider error──→ Failed(provider message)
//! ```
//!
//! A submission while another is in flight is refused with
//! [`FlowError::InFlight`] and leaves the state untouched. A validation
//! failure never reaches the provider; it lands directly in
//! `Failed(message)` so the form can show it inline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use coregate_model::{Route, SubmissionState};
use coregate_provider::IdentityProvider;
use tokio::sync::watch;

use crate::{FlowConfig, FlowError, ValidationError};

const SIGNED_IN: &str = "Signed in";
const CONFIRMATION_SENT: &str = "Check your email for the confirmation link!";
const RESET_SENT: &str = "Check your email for the password reset link!";

/// What the caller should do after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Go to this route.
    Navigate(Route),
}

struct FormInner<P> {
    provider: Arc<P>,
    state: watch::Sender<SubmissionState>,
    discarded: AtomicBool,
    config: FlowConfig,
}

/// Drives one credential form interaction.
///
/// Cloning yields another handle to the same form (and the same
/// `SubmissionState`).
pub struct CredentialForm<P> {
    inner: Arc<FormInner<P>>,
}

impl<P> Clone for CredentialForm<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

impl<P: IdentityProvider> CredentialForm<P> {
    pub fn new(provider: Arc<P>, config: FlowConfig) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            inner: Arc::new(FormInner {
                provider,
                state,
                discarded: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// The current submission state.
    pub fn state(&self) -> SubmissionState {
        self.inner.state.borrow().clone()
    }

    /// A receiver that sees every submission state change.
    pub fn watch(&self) -> watch::Receiver<SubmissionState> {
        self.inner.state.subscribe()
    }

    pub fn config(&self) -> &FlowConfig {
        &self.inner.config
    }

    /// Ends the interaction. Results of calls still in flight are dropped
    /// and further submissions are refused.
    pub fn discard(&self) {
        self.inner.discarded.store(true, Ordering::SeqCst);
    }

    pub fn is_discarded(&self) -> bool {
        self.inner.discarded.load(Ordering::SeqCst)
    }

    /// Signs in with email and password.
    ///
    /// On success the state becomes `Succeeded("Signed in")` and the
    /// caller is told to navigate to the dashboard. The session store
    /// learns about the new session from the provider's `SignedIn` event.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, FlowError> {
        let email = email.trim();
        let submission = self.begin(validate_credentials(email, password))?;

        match self.inner.provider.sign_in_with_password(email, password).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "sign-in succeeded");
                submission.finish(SubmissionState::Succeeded(SIGNED_IN.to_string()));
                Ok(SignInOutcome::Navigate(Route::Dashboard))
            }
            Err(err) => {
                tracing::warn!(error = %err, "sign-in failed");
                submission.finish(SubmissionState::Failed(err.message()));
                Err(err.into())
            }
        }
    }

    /// Registers a new account. The user must confirm their email before
    /// signing in, so the auth state does not change.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), FlowError> {
        let email = email.trim();
        let submission = self.begin(validate_credentials(email, password))?;

        match self.inner.provider.sign_up(email, password).await {
            Ok(()) => {
                tracing::info!("sign-up submitted");
                submission.finish(SubmissionState::Succeeded(CONFIRMATION_SENT.to_string()));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "sign-up failed");
                submission.finish(SubmissionState::Failed(err.message()));
                Err(err.into())
            }
        }
    }

    /// Asks the provider to email a password-reset link that lands on
    /// [`FlowConfig::reset_redirect`].
    pub async fn request_password_reset(&self, email: &str) -> Result<(), FlowError> {
        let email = email.trim();
        let validation = if email.is_empty() {
            Err(ValidationError::MissingEmail)
        } else {
            Ok(())
        };
        let submission = self.begin(validation)?;

        let redirect_to = self.inner.config.reset_redirect();
        match self
            .inner
            .provider
            .request_password_reset(email, &redirect_to)
            .await
        {
            Ok(()) => {
                tracing::info!(%redirect_to, "password reset requested");
                submission.finish(SubmissionState::Succeeded(RESET_SENT.to_string()));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "password reset request failed");
                submission.finish(SubmissionState::Failed(err.message()));
                Err(err.into())
            }
        }
    }

    /// Moves to `Submitting` (or `Failed` for invalid input), atomically
    /// refusing if a submission is already running.
    fn begin(
        &self,
        validation: Result<(), ValidationError>,
    ) -> Result<Submission<'_, P>, FlowError> {
        if self.is_discarded() {
            return Err(FlowError::Discarded);
        }

        let mut outcome = Ok(());
        self.inner.state.send_if_modified(|state| {
            if state.is_submitting() {
                outcome = Err(FlowError::InFlight);
                return false;
            }
            match &validation {
                Ok(()) => *state = SubmissionState::Submitting,
                Err(err) => {
                    *state = SubmissionState::Failed(err.to_string());
                    outcome = Err(FlowError::Validation(err.clone()));
                }
            }
            true
        });

        if let Err(err) = &outcome {
            tracing::debug!(error = %err, "submission not started");
        }
        outcome.map(|()| Submission {
            inner: &self.inner,
            armed: true,
        })
    }
}

/// A running submission. Dropped without [`finish`](Submission::finish)
/// (the caller cancelled the future), it puts the form back to `Idle`.
struct Submission<'a, P> {
    inner: &'a FormInner<P>,
    armed: bool,
}

impl<P> Submission<'_, P> {
    fn finish(mut self, terminal: SubmissionState) {
        self.armed = false;
        if self.inner.discarded.load(Ordering::SeqCst) {
            tracing::debug!("form discarded, dropping result");
            return;
        }
        self.inner.state.send_replace(terminal);
    }
}

impl<P> Drop for Submission<'_, P> {
    fn drop(&mut self) {
        if !self.armed || self.inner.discarded.load(Ordering::SeqCst) {
            return;
        }
        tracing::debug!("submission cancelled before the provider answered");
        self.inner.state.send_replace(SubmissionState::Idle);
    }
}
