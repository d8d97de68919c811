//! Route guarding for Coregate.
//!
//! Decides, from the current [`AuthState`](coregate_model::AuthState),
//! whether a route may render, must wait, or must redirect to the login
//! page.
//!
//! - [`evaluate`]: the pure decision for one route
//! - [`Navigator`]: a history stack that applies decisions and the app's
//!   static redirects (`/` → `/dashboard`)
//! - [`GuardWatcher`]: keeps a navigator in sync with a
//!   [`SessionStore`](coregate_session::SessionStore), re-evaluating on
//!   every transition

mod error;
mod guard;
mod navigator;
mod watcher;

pub use error::NavigationError;
pub use guard::{GuardDecision, evaluate};
pub use navigator::{DEFAULT_MAX_REDIRECTS, Navigator, View};
pub use watcher::GuardWatcher;
