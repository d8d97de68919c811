//! Change notifications pushed by the identity provider.

use crate::Session;

/// An authentication change reported by the identity provider.
///
/// The provider emits these whenever its view of the current session
/// changes: after a credential operation or sign-out, and on background
/// token refresh. Coregate never derives them itself.
///
/// Like `AuthState`, each variant carries exactly the data it needs:
/// `SignedOut` has no session, the other two carry the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// A user signed in and this session is now active.
    SignedIn(Session),

    /// The active session ended.
    SignedOut,

    /// The provider rotated tokens; this session replaces the previous one.
    TokenRefreshed(Session),
}

impl ProviderEvent {
    /// The session this event makes active, or `None` for `SignedOut`.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => {
                Some(session)
            }
            Self::SignedOut => None,
        }
    }

    /// Consumes the event, yielding the session it makes active.
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => {
                Some(session)
            }
            Self::SignedOut => None,
        }
    }

    /// Short event name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed(_) => "TOKEN_REFRESHED",
        }
    }
}
