//! Unified error type for Coregate.

use coregate_flow::FlowError;
use coregate_guard::NavigationError;
use coregate_provider::ProviderError;

use crate::ProfileError;

/// An environment value could not be turned into configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CoregateError {
    /// The identity provider refused or failed a request.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A credential flow did not run or did not succeed.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// Navigation could not be resolved.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The backend profile could not be read.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
