//! The guard decision itself: a pure function of auth state and route.

use coregate_model::{AuthState, Route};

/// What to do with a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render nothing and wait. Never redirects.
    Suspend,

    /// Go elsewhere. `replace` means the current history entry is
    /// overwritten rather than a new one pushed.
    Redirect { to: Route, replace: bool },

    /// Render this route.
    Render(Route),
}

/// Decides whether `route` may render under `state`.
///
/// | State             | Protected route              | Public route    |
/// |-------------------|------------------------------|-----------------|
/// | `Initializing`    | `Suspend`                    | `Suspend`       |
/// | `Unauthenticated` | `Redirect(/login, replace)`  | `Render`        |
/// | `Authenticated`   | `Render`                     | `Render`        |
///
/// Nothing renders before the initial lookup resolves, so a signed-in
/// user is never bounced to the login page on a cold start.
pub fn evaluate(state: &AuthState, route: &Route) -> GuardDecision {
    match state {
        AuthState::Initializing => GuardDecision::Suspend,
        AuthState::Unauthenticated if route.is_protected() => GuardDecision::Redirect {
            to: Route::Login,
            replace: true,
        },
        AuthState::Unauthenticated | AuthState::Authenticated(_) => {
            GuardDecision::Render(route.clone())
        }
    }
}
