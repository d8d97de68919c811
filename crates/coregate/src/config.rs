//! Application-level configuration.

use std::time::Duration;

use coregate_flow::FlowConfig;
use coregate_session::StoreConfig;
use url::Url;

use crate::ConfigError;

/// Everything an [`AuthContext`](crate::AuthContext) needs besides the
/// identity provider.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Origin of the application itself; password-reset links land here.
    pub origin: Url,

    /// Base URL of the backend serving `/api/profile`.
    pub backend_url: Url,

    /// Timeout for backend requests.
    pub request_timeout: Duration,

    pub store: StoreConfig,
}

impl ContextConfig {
    pub const ORIGIN_VAR: &'static str = "COREGATE_ORIGIN";
    pub const BACKEND_URL_VAR: &'static str = "COREGATE_BACKEND_URL";

    const DEFAULT_ORIGIN: &'static str = "http://localhost:3000";
    const DEFAULT_BACKEND_URL: &'static str = "http://localhost:8001";

    /// Reads `COREGATE_ORIGIN` and `COREGATE_BACKEND_URL`, falling back to
    /// the local development defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = |var: &'static str, default: &str| {
            let raw = lookup(var).unwrap_or_else(|| default.to_string());
            Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { var, source })
        };

        Ok(Self {
            origin: url(Self::ORIGIN_VAR, Self::DEFAULT_ORIGIN)?,
            backend_url: url(Self::BACKEND_URL_VAR, Self::DEFAULT_BACKEND_URL)?,
            request_timeout: Duration::from_secs(10),
            store: StoreConfig::default(),
        })
    }

    /// The flow configuration derived from this one.
    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig::new(self.origin.clone())
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        match Self::from_lookup(|_| None) {
            Ok(config) => config,
            // The defaults are literals; they always parse.
            Err(err) => unreachable!("default config is invalid: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_points_at_local_development() {
        let config = ContextConfig::default();
        assert_eq!(config.origin.as_str(), "http://localhost:3000/");
        assert_eq!(config.backend_url.as_str(), "http://localhost:8001/");
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let env = HashMap::from([
            ("COREGATE_ORIGIN", "https://app.example.com"),
            ("COREGATE_BACKEND_URL", " https://api.example.com "),
        ]);
        let config =
            ContextConfig::from_lookup(|var| env.get(var).map(|v| v.to_string())).unwrap();

        assert_eq!(config.origin.host_str(), Some("app.example.com"));
        assert_eq!(config.backend_url.host_str(), Some("api.example.com"));
        assert_eq!(
            config.flow_config().reset_redirect().as_str(),
            "https://app.example.com/reset-password"
        );
    }

    #[test]
    fn test_from_lookup_rejects_invalid_url() {
        let err = ContextConfig::from_lookup(|var| {
            (var == "COREGATE_BACKEND_URL").then(|| "not a url".to_string())
        })
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidUrl {
                var: "COREGATE_BACKEND_URL",
                ..
            }
        ));
    }
}
