//! Flow configuration.

use coregate_model::Route;
use url::Url;

/// Configuration shared by the credential flows.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// The application's origin, e.g. `https://app.example.com`.
    ///
    /// Password-reset links point back here.
    pub origin: Url,

    /// Path of the page reset links land on.
    pub reset_path: String,
}

impl FlowConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            reset_path: Route::RESET_PASSWORD_PATH.to_string(),
        }
    }

    /// The absolute URL password-reset emails link to.
    pub fn reset_redirect(&self) -> Url {
        let mut url = self.origin.clone();
        url.set_path(&self.reset_path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        // Parsing a literal: the only failure mode is a typo here.
        Self::new(Url::parse("http://localhost:3000").expect("static origin is a valid URL"))
    }
}
