//! Supabase (GoTrue) identity provider over HTTPS.
//!
//! Endpoints used, all under `{project_url}/auth/v1`:
//!
//! | Operation              | Request                                        |
//! |------------------------|------------------------------------------------|
//! | password sign-in       | `POST /token?grant_type=password`              |
//! | token refresh          | `POST /token?grant_type=refresh_token`         |
//! | sign-up                | `POST /signup`                                 |
//! | password reset         | `POST /recover?redirect_to=...`                |
//! | sign-out               | `POST /logout` (with the user's bearer token)  |
//!
//! Every request carries the project's anon key in the `apikey` header.
//! The provider keeps the current session in memory and refreshes it
//! transparently when the initial lookup finds it expired.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use coregate_model::{ProviderEvent, Session, User};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{EventHub, IdentityProvider, ProviderError, Subscription};

/// Connection settings for a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: Url,

    /// The project's public anon key.
    pub anon_key: String,

    /// A session is refreshed when it expires within this window.
    pub refresh_leeway: Duration,

    /// Per-request timeout.
    pub timeout: StdDuration,
}

impl SupabaseConfig {
    pub fn new(url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            url,
            anon_key: anon_key.into(),
            refresh_leeway: Duration::seconds(30),
            timeout: StdDuration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// The token document GoTrue returns for password and refresh grants.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(Duration::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl))
            });

        let mut session = Session::new(self.access_token, self.user);
        session.refresh_token = self.refresh_token;
        session.expires_at = expires_at;
        if let Some(token_type) = self.token_type {
            session.token_type = token_type;
        }
        session
    }
}

/// Logs a response body without leaking its content.
fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

fn str_field<'a>(body: &'a Option<serde_json::Value>, key: &str) -> Option<&'a str> {
    body.as_ref()?.get(key)?.as_str()
}

/// Maps a non-success GoTrue response to a [`ProviderError`].
///
/// GoTrue has used several error shapes over time
/// (`error_description`, `msg`, `message`, `error`); the first one present
/// becomes the user-visible message.
fn classify(status: StatusCode, body: &str) -> ProviderError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| str_field(&parsed, key))
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    let bad_credentials = str_field(&parsed, "error_code") == Some("invalid_credentials")
        || (str_field(&parsed, "error") == Some("invalid_grant")
            && message == "Invalid login credentials");

    match status.as_u16() {
        429 => ProviderError::RateLimited(message),
        400 if bad_credentials => ProviderError::InvalidCredentials(message),
        code if code >= 500 => ProviderError::Unavailable(message),
        code => ProviderError::Rejected {
            status: code,
            message,
        },
    }
}

fn lock(session: &Mutex<Option<Session>>) -> MutexGuard<'_, Option<Session>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An [`IdentityProvider`] backed by a Supabase project.
pub struct SupabaseProvider {
    http: reqwest::Client,
    config: SupabaseConfig,
    session: Mutex<Option<Session>>,
    hub: EventHub,
}

impl SupabaseProvider {
    /// Builds the HTTP client for `config`.
    pub fn new(config: SupabaseConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        tracing::info!(url = %config.url, "Supabase provider configured");

        Ok(Self {
            http,
            config,
            session: Mutex::new(None),
            hub: EventHub::new(),
        })
    }

    /// Seeds the provider with a session persisted by the application.
    pub fn with_session(self, session: Session) -> Self {
        *lock(&self.session) = Some(session);
        self
    }

    /// The session currently held, without any network round-trip.
    pub fn cached_session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/auth/v1/{}",
            self.config.url.as_str().trim_end_matches('/'),
            path
        )
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        op: &'static str,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = request
            .header("apikey", &self.config.anon_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body_summary = summarize_response_body(&body);
        tracing::warn!(op, status = %status, body_summary = %body_summary, "identity provider rejected request");
        Err(classify(status, &body))
    }

    async fn token_grant<T: Serialize + ?Sized>(
        &self,
        grant_type: &'static str,
        body: &T,
    ) -> Result<Session, ProviderError> {
        let request = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .bearer_auth(&self.config.anon_key)
            .json(body);
        let response = self.send(request, grant_type).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(token.into_session(Utc::now()))
    }

    /// Exchanges the current refresh token for a new session and emits
    /// `TokenRefreshed`.
    pub async fn refresh_session(&self) -> Result<Session, ProviderError> {
        let refresh_token = lock(&self.session)
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| ProviderError::Rejected {
                status: 401,
                message: "No refresh token available".into(),
            })?;

        let session = self
            .token_grant(
                "refresh_token",
                &RefreshRequest {
                    refresh_token: &refresh_token,
                },
            )
            .await?;

        *lock(&self.session) = Some(session.clone());
        tracing::debug!(user_id = %session.user.id, "session refreshed");
        self.hub.emit(ProviderEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }
}

impl IdentityProvider for SupabaseProvider {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        let Some(session) = self.cached_session() else {
            return Ok(None);
        };
        if !session.is_expired_within(Utc::now(), self.config.refresh_leeway) {
            return Ok(Some(session));
        }

        tracing::debug!(user_id = %session.user.id, "stored session near expiry, refreshing");
        match self.refresh_session().await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(err) => {
                *lock(&self.session) = None;
                Err(err)
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let session = self
            .token_grant("password", &PasswordCredentials { email, password })
            .await?;

        *lock(&self.session) = Some(session.clone());
        tracing::info!(user_id = %session.user.id, "signed in with password");
        self.hub.emit(ProviderEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), ProviderError> {
        let request = self
            .http
            .post(self.endpoint("signup"))
            .bearer_auth(&self.config.anon_key)
            .json(&PasswordCredentials { email, password });
        self.send(request, "signup").await?;
        tracing::info!("sign-up accepted, awaiting email confirmation");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let previous = lock(&self.session).take();

        if let Some(session) = previous {
            let request = self
                .http
                .post(self.endpoint("logout"))
                .bearer_auth(&session.access_token);
            if let Err(err) = self.send(request, "logout").await {
                // The local session is gone either way.
                tracing::warn!(error = %err, "remote logout failed");
            }
        }

        self.hub.emit(ProviderEvent::SignedOut);
        Ok(())
    }

    async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &Url,
    ) -> Result<(), ProviderError> {
        let request = self
            .http
            .post(self.endpoint("recover"))
            .query(&[("redirect_to", redirect_to.as_str())])
            .bearer_auth(&self.config.anon_key)
            .json(&RecoverRequest { email });
        self.send(request, "recover").await?;
        tracing::info!(%redirect_to, "password reset email requested");
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }
}
