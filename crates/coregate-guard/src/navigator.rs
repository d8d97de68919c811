//! Client-side navigation with guard decisions applied.
//!
//! The navigator keeps a browser-like history stack. Every navigation is
//! resolved to a [`View`] by following redirects until something renders
//! or the guard suspends:
//!
//! ```text
//! "/" ──(static redirect, replace)──→ "/dashboard" ──(guard)──→ Render
//!                                                       └──→ Redirect "/login" (replace)
//! ```
//!
//! Redirects with `replace` overwrite the current history entry, so
//! "back" never lands on a page that would immediately redirect again.

use coregate_model::{AuthState, Route};

use crate::{GuardDecision, NavigationError, evaluate};

/// Redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 8;

/// What the application should currently display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// Nothing (auth state not resolved yet).
    #[default]
    Blank,
    /// This page.
    Page(Route),
}

impl View {
    /// The rendered route, if any.
    pub fn route(&self) -> Option<&Route> {
        match self {
            Self::Page(route) => Some(route),
            Self::Blank => None,
        }
    }
}

/// Redirects that hold regardless of auth state.
fn static_redirect(route: &Route) -> Option<Route> {
    match route {
        Route::Root => Some(Route::Dashboard),
        _ => None,
    }
}

/// A history stack plus the view resolved for its top entry.
#[derive(Debug, Clone)]
pub struct Navigator {
    /// Never empty; the last entry is the current location.
    history: Vec<Route>,
    view: View,
    max_redirects: usize,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator {
    /// Starts at `path` with nothing rendered yet.
    pub fn new(path: &str) -> Self {
        Self {
            history: vec![Route::parse(path)],
            view: View::Blank,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// The current location.
    pub fn current(&self) -> &Route {
        static ROOT: Route = Route::Root;
        self.history.last().unwrap_or(&ROOT)
    }

    /// All history entries, oldest first.
    pub fn history(&self) -> &[Route] {
        &self.history
    }

    /// The view resolved by the last navigation or refresh.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Pushes `path` and resolves it.
    pub fn navigate(&mut self, path: &str, state: &AuthState) -> Result<View, NavigationError> {
        let route = Route::parse(path);
        tracing::debug!(%route, "navigate");
        self.history.push(route);
        self.settle(state)
    }

    /// Re-resolves the current location, e.g. after an auth transition.
    pub fn refresh(&mut self, state: &AuthState) -> Result<View, NavigationError> {
        self.settle(state)
    }

    /// Pops the current entry and resolves the previous one.
    ///
    /// Returns `None` (and changes nothing) at the start of history.
    pub fn back(&mut self, state: &AuthState) -> Option<Result<View, NavigationError>> {
        if self.history.len() <= 1 {
            return None;
        }
        self.history.pop();
        Some(self.settle(state))
    }

    fn settle(&mut self, state: &AuthState) -> Result<View, NavigationError> {
        let mut hops = 0;
        loop {
            let route = self.current().clone();
            let decision = match static_redirect(&route) {
                Some(to) if state.is_resolved() => GuardDecision::Redirect { to, replace: true },
                _ => evaluate(state, &route),
            };

            match decision {
                GuardDecision::Suspend => {
                    self.view = View::Blank;
                    return Ok(View::Blank);
                }
                GuardDecision::Render(route) => {
                    if self.view.route() != Some(&route) {
                        tracing::info!(%route, "rendering route");
                    }
                    self.view = View::Page(route);
                    return Ok(self.view.clone());
                }
                GuardDecision::Redirect { to, replace } => {
                    hops += 1;
                    if hops > self.max_redirects {
                        tracing::warn!(%route, hops, "redirect limit reached");
                        self.view = View::Blank;
                        return Err(NavigationError::TooManyRedirects {
                            path: route.path().to_string(),
                            hops,
                        });
                    }
                    tracing::debug!(from = %route, %to, replace, "redirect");
                    match self.history.last_mut() {
                        Some(last) if replace => *last = to,
                        _ => self.history.push(to),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use coregate_model::{Session, User};

    use super::*;

    fn authenticated() -> AuthState {
        AuthState::Authenticated(Session::new(
            "tok",
            User {
                id: "u1".into(),
                email: "u@x.com".into(),
            },
        ))
    }

    #[test]
    fn test_navigate_while_initializing_renders_nothing() {
        let mut nav = Navigator::default();
        for path in ["/", "/login", "/dashboard"] {
            assert_eq!(nav.navigate(path, &AuthState::Initializing), Ok(View::Blank));
        }
        // No redirect was applied to history.
        assert_eq!(nav.current(), &Route::Dashboard);
    }

    #[test]
    fn test_root_unauthenticated_ends_at_login() {
        let mut nav = Navigator::new("/");

        let view = nav.refresh(&AuthState::Unauthenticated).unwrap();

        assert_eq!(view, View::Page(Route::Login));
        assert_eq!(nav.history(), &[Route::Login]);
    }

    #[test]
    fn test_root_authenticated_ends_at_dashboard() {
        let mut nav = Navigator::new("/");

        let view = nav.refresh(&authenticated()).unwrap();

        assert_eq!(view, View::Page(Route::Dashboard));
        assert_eq!(nav.history(), &[Route::Dashboard]);
    }

    #[test]
    fn test_dashboard_redirect_replaces_history_entry() {
        let mut nav = Navigator::new("/login");
        nav.refresh(&AuthState::Unauthenticated).unwrap();

        nav.navigate("/dashboard", &AuthState::Unauthenticated).unwrap();

        assert_eq!(nav.history(), &[Route::Login, Route::Login]);
        assert_eq!(nav.view(), &View::Page(Route::Login));
    }

    #[test]
    fn test_refresh_after_sign_out_leaves_dashboard() {
        let mut nav = Navigator::new("/dashboard");
        nav.refresh(&authenticated()).unwrap();
        assert_eq!(nav.view(), &View::Page(Route::Dashboard));

        let view = nav.refresh(&AuthState::Unauthenticated).unwrap();

        assert_eq!(view, View::Page(Route::Login));
    }

    #[test]
    fn test_unknown_path_renders_not_found() {
        let mut nav = Navigator::default();
        let view = nav.navigate("/nope", &AuthState::Unauthenticated).unwrap();
        assert_eq!(view, View::Page(Route::NotFound("/nope".into())));
    }

    #[test]
    fn test_back_at_start_is_none() {
        let mut nav = Navigator::new("/login");
        assert!(nav.back(&AuthState::Unauthenticated).is_none());
        assert_eq!(nav.history().len(), 1);
    }

    #[test]
    fn test_back_resolves_previous_entry() {
        let mut nav = Navigator::new("/login");
        let state = authenticated();
        nav.refresh(&state).unwrap();
        nav.navigate("/dashboard", &state).unwrap();

        let view = nav.back(&state).unwrap().unwrap();

        assert_eq!(view, View::Page(Route::Login));
    }

    #[test]
    fn test_redirect_limit_is_enforced() {
        let mut nav = Navigator::new("/").with_max_redirects(0);

        let err = nav.refresh(&authenticated()).unwrap_err();

        assert_eq!(
            err,
            NavigationError::TooManyRedirects {
                path: "/".into(),
                hops: 1
            }
        );
        assert_eq!(nav.view(), &View::Blank);
    }
}
