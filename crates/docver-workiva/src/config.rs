//! HTTP client configuration

use docver_core::ConfigError;
use std::time::Duration;

/// Platform API base URL
pub const BASE_URL_VAR: &str = "WORKIVA_API_BASE_URL";

/// Bearer token for every request
pub const ACCESS_TOKEN_VAR: &str = "WORKIVA_ACCESS_TOKEN";

/// Per-request timeout in seconds
pub const TIMEOUT_VAR: &str = "WORKIVA_TIMEOUT_SECS";

/// Default platform API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.app.wdesk.com";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`WorkivaClient`](crate::WorkivaClient)
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// OAuth bearer token
    pub access_token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load from environment variables
    ///
    /// # Errors
    /// [`ConfigError::Missing`] without an access token,
    /// [`ConfigError::Invalid`] for a malformed timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    ///
    /// # Errors
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let access_token = non_blank(ACCESS_TOKEN_VAR).ok_or(ConfigError::Missing(ACCESS_TOKEN_VAR))?;
        let mut config = Self::new(access_token);

        if let Some(base_url) = non_blank(BASE_URL_VAR) {
            config = config.with_base_url(base_url);
        }
        if let Some(timeout) = non_blank(TIMEOUT_VAR) {
            let secs: u64 = timeout
                .parse()
                .map_err(|_| ConfigError::invalid(TIMEOUT_VAR, format!("expected whole seconds, got '{timeout}'")))?;
            if secs == 0 {
                return Err(ConfigError::invalid(TIMEOUT_VAR, "timeout must be positive"));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
