//! The backend's profile record for the signed-in user.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Profile data returned by `GET /api/profile`.
///
/// Only the fields the dashboard shows are modeled; serde ignores the
/// rest of the backend document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,

    #[serde(default)]
    pub full_name: Option<String>,

    /// When the profile was created ("Member since").
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Shown when the user never filled in their name.
    pub const UNSET_NAME: &'static str = "Not set";

    /// The full name, or [`Profile::UNSET_NAME`] when missing or blank.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => Self::UNSET_NAME,
        }
    }

    /// `created_at` as a calendar date, e.g. `2024-03-01`.
    pub fn member_since(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

/// Accepts RFC 3339 timestamps and the backend's offset-less UTC
/// timestamps (`2024-01-01T12:00:00.123456`).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
