/// Errors reported by an identity provider.
///
/// The `Display` text of the credential-facing variants is exactly the
/// provider's message, because forms show it to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The email/password pair was rejected.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The provider refused the request for another reason
    /// (unconfirmed email, duplicate account, malformed input, ...).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Too many requests; the provider asked us to back off.
    #[error("{0}")]
    RateLimited(String),

    /// The request never got a usable answer (DNS, TLS, connection reset,
    /// undecodable body).
    #[error("network error: {0}")]
    Network(String),

    /// The provider is not able to serve requests right now.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// The human-readable message to surface to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The HTTP status the provider answered with, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials(_) => Some(400),
            Self::Rejected { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            Self::Network(_) | Self::Unavailable(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_verbatim_for_credential_errors() {
        let err = ProviderError::InvalidCredentials("Invalid login credentials".into());
        assert_eq!(err.message(), "Invalid login credentials");

        let err = ProviderError::Rejected {
            status: 400,
            message: "Email not confirmed".into(),
        };
        assert_eq!(err.message(), "Email not confirmed");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProviderError::RateLimited("slow".into()).status(), Some(429));
        assert_eq!(ProviderError::Network("reset".into()).status(), None);
    }
}
