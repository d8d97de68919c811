//! Error types for navigation.

/// Errors that can occur while resolving a navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// Redirects kept chaining past the configured limit.
    #[error("too many redirects starting from {path} ({hops} hops)")]
    TooManyRedirects { path: String, hops: usize },
}
