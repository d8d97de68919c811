//! The two state machines Coregate drives.
//!
//! - [`AuthState`]: application-wide: is anybody signed in?
//! - [`SubmissionState`]: per form interaction: what happened to the
//!   last submit?

use std::fmt;

use crate::{Session, User};

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// The three-way authentication status of the application.
///
/// ```text
///   Initializing ──(initial lookup or first push)──→ Unauthenticated
///        │                                              ↑     │
///        └──────────────────────────────────→ Authenticated ←─┘
///                                           (provider events only)
/// ```
///
/// - **Initializing**: the initial session lookup hasn't resolved yet.
///   Nothing that depends on identity may render or redirect.
/// - **Unauthenticated**: resolved, nobody is signed in.
/// - **Authenticated**: resolved, the carried [`Session`] is active.
///
/// Leaving `Initializing` happens exactly once. After that the state only
/// moves between the two resolved values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Initializing,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    /// Builds the resolved state for an optional session.
    pub fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) => Self::Authenticated(session),
            None => Self::Unauthenticated,
        }
    }

    /// Returns `true` once the initial lookup (or a push) has settled the
    /// state.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Initializing)
    }

    /// Returns `true` if a session is active.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// The signed-in user, derived from the active session.
    pub fn user(&self) -> Option<&User> {
        self.session().map(|session| &session.user)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "Initializing"),
            Self::Unauthenticated => write!(f, "Unauthenticated"),
            Self::Authenticated(session) => {
                write!(f, "Authenticated({})", session.user.id)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SubmissionState
// ---------------------------------------------------------------------------

/// The state of a single credential-form submission.
///
/// ```text
///   Idle ──→ Submitting ──→ Succeeded(message)
///    ↑           │
///    │           └────────→ Failed(message)
///    └── (new submission starts from any non-Submitting state)
/// ```
///
/// A fresh value lives only as long as the form interaction that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(String),
    Failed(String),
}

impl SubmissionState {
    /// Returns `true` while a provider call is in flight.
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Returns `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// The user-visible message carried by a terminal state.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Succeeded(msg) | Self::Failed(msg) => Some(msg),
            Self::Idle | Self::Submitting => None,
        }
    }

    /// The error text to show inline, if the submission failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}
