//! In-memory identity provider for tests and demos.
//!
//! [`MockProvider`] keeps a table of accounts, issues random tokens, emits
//! the same events a real provider would, and lets a test script failures
//! and slow lookups:
//!
//! - [`MockProvider::fail_next`] makes the next call of one operation fail.
//! - [`MockProvider::gate_lookup`] holds the next `current_session` call
//!   until the returned sender fires (or is dropped), after snapshotting
//!   the session it will report. That reproduces a slow initial lookup
//!   racing a pushed event.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use coregate_model::{ProviderEvent, Session, User};
use rand::Rng;
use tokio::sync::oneshot;
use url::Url;

use crate::{EventHub, IdentityProvider, ProviderError, Subscription};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";
const ALREADY_REGISTERED: &str = "User already registered";

/// Lifetime of sessions issued by the mock.
const SESSION_TTL_SECS: i64 = 3600;

/// The provider operations a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Lookup,
    SignIn,
    SignUp,
    SignOut,
    PasswordReset,
}

/// Record of the calls a [`MockProvider`] has served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    pub lookups: usize,
    pub sign_ins: usize,
    pub sign_ups: usize,
    pub sign_outs: usize,
    /// `(email, redirect_to)` for every reset request, in order.
    pub resets: Vec<(String, Url)>,
}

struct Account {
    user: User,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct MockState {
    accounts: HashMap<String, Account>,
    current: Option<Session>,
    failures: HashMap<MockOperation, ProviderError>,
    calls: CallLog,
    next_user: u64,
}

impl MockState {
    fn add_account(&mut self, email: &str, password: &str, confirmed: bool) -> User {
        self.next_user += 1;
        let user = User {
            id: format!("user-{}", self.next_user),
            email: email.to_string(),
        };
        self.accounts.insert(
            normalize(email),
            Account {
                user: user.clone(),
                password: password.to_string(),
                confirmed,
            },
        );
        user
    }

    fn take_failure(&mut self, op: MockOperation) -> Result<(), ProviderError> {
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// An [`IdentityProvider`] backed by an in-memory account table.
///
/// # Example
///
/// ```rust
/// use coregate_provider::{IdentityProvider, MockProvider};
///
/// # tokio_test_block(async {
/// let provider = MockProvider::new().with_account("ada@example.com", "hunter22");
/// let session = provider
///     .sign_in_with_password("ada@example.com", "hunter22")
///     .await
///     .unwrap();
/// assert_eq!(session.user.email, "ada@example.com");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
/// # }
/// ```
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
    lookup_gate: Mutex<Option<oneshot::Receiver<()>>>,
    hub: EventHub,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 32 lowercase hex characters (128 bits).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn issue_session(user: User) -> Session {
    let mut session = Session::new(generate_token(), user);
    session.refresh_token = Some(generate_token());
    session.expires_at = Some(Utc::now() + Duration::seconds(SESSION_TTL_SECS));
    session
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a confirmed account that can sign in immediately.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        lock(&self.state).add_account(email, password, true);
        self
    }

    /// Starts with `session` already active, as if restored from storage.
    pub fn with_session(self, session: Session) -> Self {
        lock(&self.state).current = Some(session);
        self
    }

    /// Issues a fresh session for a new confirmed account and makes it
    /// current without emitting anything. Returns the session.
    pub fn restore_session(&self, email: &str) -> Session {
        let mut state = lock(&self.state);
        let user = state.add_account(email, &generate_token(), true);
        let session = issue_session(user);
        state.current = Some(session.clone());
        session
    }

    /// Marks an account's email as verified. Returns `false` if unknown.
    pub fn confirm_email(&self, email: &str) -> bool {
        match lock(&self.state).accounts.get_mut(&normalize(email)) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Makes the next call of `op` fail with `err`.
    pub fn fail_next(&self, op: MockOperation, err: ProviderError) {
        lock(&self.state).failures.insert(op, err);
    }

    /// Holds the next `current_session` call until the returned sender is
    /// used or dropped.
    pub fn gate_lookup(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *lock(&self.lookup_gate) = Some(rx);
        tx
    }

    /// Pushes an arbitrary event to subscribers and updates the current
    /// session to match it.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        lock(&self.state).current = event.session().cloned();
        self.hub.emit(event)
    }

    /// Rotates the tokens of the current session and emits
    /// `TokenRefreshed`. Returns the new session, or `None` when nobody is
    /// signed in.
    pub fn refresh_session(&self) -> Option<Session> {
        let refreshed = {
            let mut state = lock(&self.state);
            let user = state.current.as_ref()?.user.clone();
            let session = issue_session(user);
            state.current = Some(session.clone());
            session
        };
        self.hub.emit(ProviderEvent::TokenRefreshed(refreshed.clone()));
        Some(refreshed)
    }

    /// The session the mock currently holds.
    pub fn current(&self) -> Option<Session> {
        lock(&self.state).current.clone()
    }

    /// A snapshot of the calls served so far.
    pub fn calls(&self) -> CallLog {
        lock(&self.state).calls.clone()
    }

    /// Number of live event subscriptions.
    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }
}

impl IdentityProvider for MockProvider {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        let snapshot = {
            let mut state = lock(&self.state);
            state.calls.lookups += 1;
            state.take_failure(MockOperation::Lookup)?;
            state.current.clone()
        };

        let gate = lock(&self.lookup_gate).take();
        if let Some(gate) = gate {
            tracing::debug!("mock lookup waiting on gate");
            let _ = gate.await;
        }
        Ok(snapshot)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let session = {
            let mut state = lock(&self.state);
            state.calls.sign_ins += 1;
            state.take_failure(MockOperation::SignIn)?;

            let account = match state.accounts.get(&normalize(email)) {
                Some(account) if account.password == password => account,
                _ => {
                    return Err(ProviderError::InvalidCredentials(
                        INVALID_CREDENTIALS.into(),
                    ));
                }
            };
            if !account.confirmed {
                return Err(ProviderError::Rejected {
                    status: 400,
                    message: EMAIL_NOT_CONFIRMED.into(),
                });
            }

            let session = issue_session(account.user.clone());
            state.current = Some(session.clone());
            session
        };

        tracing::debug!(user_id = %session.user.id, "mock sign-in succeeded");
        self.hub.emit(ProviderEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        let mut state = lock(&self.state);
        state.calls.sign_ups += 1;
        state.take_failure(MockOperation::SignUp)?;

        if state.accounts.contains_key(&normalize(email)) {
            return Err(ProviderError::Rejected {
                status: 422,
                message: ALREADY_REGISTERED.into(),
            });
        }
        let user = state.add_account(email, password, false);
        tracing::debug!(user_id = %user.id, "mock account registered");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        {
            let mut state = lock(&self.state);
            state.calls.sign_outs += 1;
            state.take_failure(MockOperation::SignOut)?;
            state.current = None;
        }
        self.hub.emit(ProviderEvent::SignedOut);
        Ok(())
    }

    async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &Url,
    ) -> Result<(), ProviderError> {
        let mut state = lock(&self.state);
        state
            .calls
            .resets
            .push((email.to_string(), redirect_to.clone()));
        state.take_failure(MockOperation::PasswordReset)
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }
}
