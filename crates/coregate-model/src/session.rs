//! Session and user types: what the identity provider issues.
//!
//! A session is an opaque credential bundle. Coregate never inspects the
//! tokens inside it. It only stores them, hands the access token to
//! downstream consumers, and checks the expiry metadata.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The authenticated user attached to a [`Session`].
///
/// A `User` is always read out of the current session
/// (see [`AuthState::user`](crate::AuthState::user)); nothing in Coregate
/// keeps one around on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier assigned by the identity provider.
    pub id: String,

    /// The email address the user signed in with.
    ///
    /// `#[serde(default)]` tolerates providers that omit the field
    /// (e.g. phone-only accounts) by falling back to an empty string.
    #[serde(default)]
    pub email: String,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated credential bundle issued by the identity provider.
///
/// Sessions are immutable once issued. A token refresh produces a brand
/// new `Session` that replaces the old one wholesale; nothing ever patches
/// a session in place.
///
/// `Debug` is implemented by hand so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token presented to downstream APIs.
    pub access_token: String,

    /// Token used to obtain a fresh session once this one expires.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Usually `"bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// When the access token stops being accepted, if the provider said.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    /// Who this session belongs to.
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Creates a session with no refresh token and no expiry.
    pub fn new(access_token: impl Into<String>, user: User) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: default_token_type(),
            expires_at: None,
            user,
        }
    }

    /// Returns `true` if the session has expired at `now`.
    ///
    /// Sessions without expiry metadata never expire on the client side.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_expired_within(now, Duration::zero())
    }

    /// Like [`is_expired`](Self::is_expired), but treats the session as
    /// expired `leeway` before its actual expiry.
    pub fn is_expired_within(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - leeway <= now,
            None => false,
        }
    }

    /// The `Authorization` header value for this session.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}
