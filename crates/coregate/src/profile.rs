//! Reading the signed-in user's profile from the backend.
//!
//! The profile is nice-to-have data for the dashboard. Failing to load it
//! is logged and otherwise ignored; it never affects the auth state.

use std::time::Duration;

use coregate_model::{Profile, Session};
use reqwest::header::ACCEPT;
use url::Url;

/// Why a profile could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// The request never got an answer.
    #[error("profile request failed: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("profile request returned HTTP {status}")]
    Status { status: u16 },

    /// The body was not a profile document.
    #[error("profile response could not be decoded: {0}")]
    Decode(String),
}

/// What the dashboard shows in its profile section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSlot {
    Loading,
    Loaded(Profile),
    Unavailable,
}

impl ProfileSlot {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Loaded(profile) => Some(profile),
            Self::Loading | Self::Unavailable => None,
        }
    }
}

/// HTTP client for `GET /api/profile`.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ProfileClient {
    /// Path of the profile resource, relative to the backend base URL.
    pub const PROFILE_PATH: &'static str = "api/profile";

    pub fn new(backend_url: &Url, timeout: Duration) -> Result<Self, ProfileError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProfileError::Network(e.to_string()))?;

        let mut endpoint = backend_url.clone();
        let base = endpoint.path().trim_end_matches('/').to_string();
        endpoint.set_path(&format!("{base}/{}", Self::PROFILE_PATH));

        Ok(Self { http, endpoint })
    }

    /// The full URL profile requests go to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Reads the profile for `session`'s user.
    pub async fn try_fetch(&self, session: &Session) -> Result<Profile, ProfileError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .bearer_auth(&session.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProfileError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProfileError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProfileError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ProfileError::Decode(e.to_string()))
    }

    /// Like [`try_fetch`](Self::try_fetch), but logs failures and returns
    /// `None` instead.
    pub async fn fetch(&self, session: &Session) -> Option<Profile> {
        match self.try_fetch(session).await {
            Ok(profile) => {
                tracing::debug!(user_id = %session.user.id, "profile loaded");
                Some(profile)
            }
            Err(err) => {
                tracing::warn!(user_id = %session.user.id, error = %err, "profile unavailable");
                None
            }
        }
    }
}
