//! Environment-driven configuration for the venue API.

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.foursquare.com";
pub const DEFAULT_API_VERSION: &str = "20170801";

/// Credentials and location of the venue API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Date-style version string sent as `v` on every call.
    pub api_version: String,
}

impl ApiConfig {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Read `NEARBY_API_BASE_URL`, `NEARBY_CLIENT_ID`, `NEARBY_CLIENT_SECRET`
    /// and `NEARBY_API_VERSION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("NEARBY_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "NEARBY_API_BASE_URL",
                reason: format!("expected an http(s) url, got {base_url:?}"),
            });
        }
        let client_id = lookup("NEARBY_CLIENT_ID").ok_or(ConfigError::Missing("NEARBY_CLIENT_ID"))?;
        let client_secret =
            lookup("NEARBY_CLIENT_SECRET").ok_or(ConfigError::Missing("NEARBY_CLIENT_SECRET"))?;

        let mut config = Self::new(&base_url, &client_id, &client_secret);
        if let Some(version) = lookup("NEARBY_API_VERSION") {
            config.api_version = version;
        }
        Ok(config)
    }
}
