//! Connection settings for the identity API.
//!
//! The client never reads the process environment itself; callers build a
//! [`ClientConfig`] (usually via [`ClientConfig::from_env`]) and hand it over.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_BASE_URL: &str = "OMNI_BASE_URL";
pub const ENV_API_KEY: &str = "OMNI_API_KEY";
pub const ENV_SCIM_PATH: &str = "OMNI_SCIM_PATH";
pub const ENV_TIMEOUT_SECS: &str = "OMNI_TIMEOUT_SECS";

pub const DEFAULT_SCIM_PATH: &str = "/api/scim/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Instance root, e.g. `https://acme.omniapp.co`.
    pub base_url: String,
    pub api_key: String,
    /// SCIM root below `base_url`.
    pub scim_path: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            scim_path: DEFAULT_SCIM_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_scim_path(mut self, scim_path: impl Into<String>) -> Self {
        self.scim_path = scim_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from any key lookup (environment, map, ...).
    ///
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = get(ENV_BASE_URL).ok_or(ConfigError::Missing { var: ENV_BASE_URL })?;
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                var: ENV_BASE_URL,
                value: base_url,
                reason: "expected an http:// or https:// URL",
            });
        }
        let api_key = get(ENV_API_KEY).ok_or(ConfigError::Missing { var: ENV_API_KEY })?;

        let mut config = Self::new(base_url, api_key);
        if let Some(path) = get(ENV_SCIM_PATH) {
            config = config.with_scim_path(path);
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                var: ENV_TIMEOUT_SECS,
                value: raw.clone(),
                reason: "expected a whole number of seconds",
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// [`ClientConfig::from_lookup`] over the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Absolute URL of a SCIM resource path such as `Users` or `Groups/g1`.
    pub fn endpoint(&self, resource: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let scim = self.scim_path.trim_matches('/');
        let resource = resource.trim_start_matches('/');
        if scim.is_empty() {
            format!("{base}/{resource}")
        } else {
            format!("{base}/{scim}/{resource}")
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("scim_path", &self.scim_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}
