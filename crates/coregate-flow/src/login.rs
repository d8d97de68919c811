//! The login page: one form that toggles between signing in and signing up.

use std::fmt;

use coregate_model::{Route, SubmissionState};
use coregate_provider::IdentityProvider;
use tokio::sync::watch;

use crate::{CredentialForm, FlowError, SignInOutcome};

/// Which operation the login form submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    SignIn,
    SignUp,
}

impl FormMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::SignIn => Self::SignUp,
            Self::SignUp => Self::SignIn,
        }
    }

    /// Label of the submit button while idle.
    pub fn submit_label(self) -> &'static str {
        match self {
            Self::SignIn => "Sign In",
            Self::SignUp => "Sign Up",
        }
    }

    /// Label of the link that switches modes.
    pub fn toggle_prompt(self) -> &'static str {
        match self {
            Self::SignIn => "Need an account? Sign Up",
            Self::SignUp => "Already have an account? Sign In",
        }
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.submit_label())
    }
}

/// Result of a successful [`LoginForm::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Signed in; go to this route.
    Navigate(Route),
    /// Signed up; the user has to confirm their email first.
    AwaitingConfirmation,
}

/// The login page's form.
pub struct LoginForm<P> {
    form: CredentialForm<P>,
    mode: FormMode,
}

impl<P: IdentityProvider> LoginForm<P> {
    /// Starts in sign-in mode.
    pub fn new(form: CredentialForm<P>) -> Self {
        Self {
            form,
            mode: FormMode::SignIn,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Switches between sign-in and sign-up. Returns the new mode.
    pub fn toggle_mode(&mut self) -> FormMode {
        self.mode = self.mode.toggled();
        tracing::debug!(mode = %self.mode, "login form mode toggled");
        self.mode
    }

    /// Submits with the operation of the current mode.
    pub async fn submit(&self, email: &str, password: &str) -> Result<LoginOutcome, FlowError> {
        match self.mode {
            FormMode::SignIn => {
                let SignInOutcome::Navigate(route) = self.form.sign_in(email, password).await?;
                Ok(LoginOutcome::Navigate(route))
            }
            FormMode::SignUp => {
                self.form.sign_up(email, password).await?;
                Ok(LoginOutcome::AwaitingConfirmation)
            }
        }
    }

    /// Whether the "Forgot your password?" link is shown.
    pub fn offers_password_reset(&self) -> bool {
        self.mode == FormMode::SignIn
    }

    /// Sends a reset email for `email`. Only available in sign-in mode.
    pub async fn forgot_password(&self, email: &str) -> Result<(), FlowError> {
        if !self.offers_password_reset() {
            return Err(FlowError::NotOffered);
        }
        self.form.request_password_reset(email).await
    }

    /// Text for the submit button.
    pub fn button_label(&self) -> &'static str {
        if self.form.state().is_submitting() {
            "Processing..."
        } else {
            self.mode.submit_label()
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.form.state()
    }

    pub fn watch(&self) -> watch::Receiver<SubmissionState> {
        self.form.watch()
    }

    /// The underlying form handle.
    pub fn form(&self) -> &CredentialForm<P> {
        &self.form
    }

    /// Discards the form (the page was left).
    pub fn discard(&self) {
        self.form.discard();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use coregate_provider::MockProvider;

    use super::*;
    use crate::FlowConfig;

    fn login(provider: &Arc<MockProvider>) -> LoginForm<MockProvider> {
        LoginForm::new(CredentialForm::new(Arc::clone(provider), FlowConfig::default()))
    }

    #[test]
    fn test_form_mode_toggle_and_labels() {
        assert_eq!(FormMode::default(), FormMode::SignIn);
        assert_eq!(FormMode::SignIn.toggled(), FormMode::SignUp);
        assert_eq!(FormMode::SignUp.submit_label(), "Sign Up");
        assert_eq!(
            FormMode::SignIn.toggle_prompt(),
            "Need an account? Sign Up"
        );
    }

    #[tokio::test]
    async fn test_submit_in_sign_in_mode_navigates() {
        let provider = Arc::new(MockProvider::new().with_account("a@x.com", "pw"));
        let form = login(&provider);

        let outcome = form.submit("a@x.com", "pw").await.unwrap();

        assert_eq!(outcome, LoginOutcome::Navigate(Route::Dashboard));
        assert_eq!(provider.calls().sign_ins, 1);
    }

    #[tokio::test]
    async fn test_submit_in_sign_up_mode_awaits_confirmation() {
        let provider = Arc::new(MockProvider::new());
        let mut form = login(&provider);
        assert_eq!(form.toggle_mode(), FormMode::SignUp);

        let outcome = form.submit("new@x.com", "pw").await.unwrap();

        assert_eq!(outcome, LoginOutcome::AwaitingConfirmation);
        assert_eq!(provider.calls().sign_ups, 1);
        assert_eq!(provider.calls().sign_ins, 0);
    }

    #[tokio::test]
    async fn test_forgot_password_not_offered_in_sign_up_mode() {
        let provider = Arc::new(MockProvider::new());
        let mut form = login(&provider);
        form.toggle_mode();

        assert!(!form.offers_password_reset());
        assert_eq!(form.forgot_password("u@x.com").await, Err(FlowError::NotOffered));
        assert!(provider.calls().resets.is_empty());
    }

    #[test]
    fn test_button_label_idle_follows_mode() {
        let provider = Arc::new(MockProvider::new());
        let mut form = login(&provider);
        assert_eq!(form.button_label(), "Sign In");
        form.toggle_mode();
        assert_eq!(form.button_label(), "Sign Up");
    }
}
