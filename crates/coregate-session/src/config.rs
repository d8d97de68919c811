//! Store configuration.

/// Configuration for [`SessionStore`](crate::SessionStore).
///
/// Create with `StoreConfig::default()` and override only the fields you
/// care about.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How many seconds before its `expires_at` a session found by the
    /// initial lookup is already treated as expired.
    ///
    /// Default: 0 (only sessions that have actually expired are ignored).
    pub expiry_leeway_secs: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            expiry_leeway_secs: 0,
        }
    }
}

impl StoreConfig {
    pub(crate) fn expiry_leeway(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.expiry_leeway_secs))
    }
}
