//! Client-side routes the rest of the app can navigate to.

use std::fmt;

/// A client-side location.
///
/// The route table is small and fixed:
///
/// | Path               | Route           | Protected |
/// |--------------------|-----------------|-----------|
/// | `/`                | `Root`          | no (redirects to `/dashboard`) |
/// | `/login`           | `Login`         | no        |
/// | `/dashboard`       | `Dashboard`     | yes       |
/// | `/reset-password`  | `ResetPassword` | no        |
/// | anything else      | `NotFound`      | no        |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Dashboard,
    ResetPassword,
    NotFound(String),
}

impl Route {
    /// Path of the reset-password landing page, used as the link target
    /// in reset emails.
    pub const RESET_PASSWORD_PATH: &'static str = "/reset-password";

    /// Parses a path (optionally with query string or fragment) into a route.
    ///
    /// A single trailing slash is ignored, so `/dashboard/` is the
    /// dashboard.
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let trimmed = match path.strip_suffix('/') {
            Some(rest) if !rest.is_empty() => rest,
            _ => path,
        };

        match trimmed {
            "" | "/" => Self::Root,
            "/login" => Self::Login,
            "/dashboard" => Self::Dashboard,
            Self::RESET_PASSWORD_PATH => Self::ResetPassword,
            other => Self::NotFound(other.to_string()),
        }
    }

    /// The canonical path for this route.
    pub fn path(&self) -> &str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::ResetPassword => Self::RESET_PASSWORD_PATH,
            Self::NotFound(path) => path,
        }
    }

    /// Returns `true` if rendering this route requires a session.
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Dashboard)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
