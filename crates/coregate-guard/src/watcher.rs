//! Keeps a [`Navigator`] in step with the session store.
//!
//! The watcher registers an observer on the store. Every auth transition
//! re-resolves the current location and publishes the resulting [`View`]
//! on a watch channel, so a protected page is left the moment the user
//! signs out, without polling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coregate_model::Route;
use coregate_session::{ObserverId, SessionStore};
use tokio::sync::watch;

use crate::{NavigationError, Navigator, View};

fn lock(navigator: &Mutex<Navigator>) -> MutexGuard<'_, Navigator> {
    navigator.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publishes the outcome of a resolution. Called with the navigator lock
/// held, so views go out in the order they were resolved.
fn publish(
    navigator: &Navigator,
    views: &watch::Sender<View>,
    result: Result<View, NavigationError>,
) -> Result<View, NavigationError> {
    match &result {
        Ok(view) => {
            views.send_replace(view.clone());
        }
        Err(err) => {
            tracing::warn!(error = %err, route = %navigator.current(), "navigation failed");
            views.send_replace(View::Blank);
        }
    }
    result
}

/// A navigator bound to a session store.
///
/// Dropping the watcher unregisters its observer.
pub struct GuardWatcher {
    store: Arc<SessionStore>,
    observer: ObserverId,
    navigator: Arc<Mutex<Navigator>>,
    views: Arc<watch::Sender<View>>,
}

impl GuardWatcher {
    /// Binds `navigator` to `store` and resolves its current location.
    pub fn attach(store: &Arc<SessionStore>, navigator: Navigator) -> Self {
        let navigator = Arc::new(Mutex::new(navigator));
        let (views, _) = watch::channel(View::Blank);
        let views = Arc::new(views);

        let observer = store.subscribe({
            let navigator = Arc::clone(&navigator);
            let views = Arc::clone(&views);
            move |state| {
                let mut navigator = lock(&navigator);
                let result = navigator.refresh(state);
                let _ = publish(&navigator, &views, result);
            }
        });

        let watcher = Self {
            store: Arc::clone(store),
            observer,
            navigator,
            views,
        };
        let _ = watcher.refresh();
        watcher
    }

    /// Navigates to `path` under the current auth state.
    pub fn navigate(&self, path: &str) -> Result<View, NavigationError> {
        let mut navigator = lock(&self.navigator);
        // The state is read under the navigator lock so a concurrent
        // transition is applied after this navigation, not before it.
        let result = navigator.navigate(path, &self.store.state());
        publish(&navigator, &self.views, result)
    }

    /// Re-resolves the current location.
    pub fn refresh(&self) -> Result<View, NavigationError> {
        let mut navigator = lock(&self.navigator);
        let result = navigator.refresh(&self.store.state());
        publish(&navigator, &self.views, result)
    }

    /// Goes back one history entry. `None` at the start of history.
    pub fn back(&self) -> Option<Result<View, NavigationError>> {
        let mut navigator = lock(&self.navigator);
        let result = navigator.back(&self.store.state())?;
        Some(publish(&navigator, &self.views, result))
    }

    /// The view currently published.
    pub fn view(&self) -> View {
        self.views.borrow().clone()
    }

    /// A receiver that sees every published view.
    pub fn views(&self) -> watch::Receiver<View> {
        self.views.subscribe()
    }

    pub fn current_route(&self) -> Route {
        lock(&self.navigator).current().clone()
    }

    pub fn history(&self) -> Vec<Route> {
        lock(&self.navigator).history().to_vec()
    }
}

impl Drop for GuardWatcher {
    fn drop(&mut self) {
        self.store.unsubscribe(self.observer);
        tracing::debug!(observer = %self.observer, "guard watcher detached");
    }
}
