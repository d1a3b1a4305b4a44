//! Transport settings shared by every session the client creates.

use std::time::Duration;

/// Settings applied to each HTTP agent. Per-request timeouts come from the
/// request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub user_agent: String,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("nearby/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Read `NEARBY_USER_AGENT` and `NEARBY_CONNECT_TIMEOUT_MS`; unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(agent) = lookup("NEARBY_USER_AGENT").filter(|a| !a.is_empty()) {
            config.user_agent = agent;
        }
        if let Some(raw) = lookup("NEARBY_CONNECT_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => config.connect_timeout = Some(Duration::from_millis(ms)),
                Err(err) => tracing::warn!(%raw, error = %err, "ignoring NEARBY_CONNECT_TIMEOUT_MS"),
            }
        }
        config
    }
}
