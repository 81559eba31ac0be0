// SPDX-License-Identifier: BUSL-1.1
//! Tribune backend client configuration.
//!
//! The bearer token is not part of the configuration: it is read from the
//! session store on every request, so a login or a 401 purge takes effect
//! immediately.

use url::Url;

/// Default backend address.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8090";

/// Configuration for connecting to the Tribune backend.
#[derive(Debug, Clone)]
pub struct TribuneApiConfig {
    /// Base URL every path is joined onto.
    pub base_url: Url,
    /// Request timeout in seconds. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl TribuneApiConfig {
    /// Configuration for `base_url` with no timeout.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `TRIBUNE_API_URL` (default: `http://127.0.0.1:8090`)
    /// - `TRIBUNE_TIMEOUT_SECS` (default: unset, no timeout)
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = match std::env::var("TRIBUNE_TIMEOUT_SECS") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            ),
            Err(_) => None,
        };
        Ok(Self {
            base_url: env_url("TRIBUNE_API_URL", DEFAULT_API_URL)?,
            timeout_secs,
            user_agent: default_user_agent(),
        })
    }

    /// Configuration pointing at a local server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local(port: u16) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&format!("http://127.0.0.1:{port}"))
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        Ok(Self {
            base_url,
            timeout_secs: Some(5),
            user_agent: default_user_agent(),
        })
    }

    /// Parse and install an explicit base URL, e.g. from a CLI flag.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = Url::parse(raw)
            .map_err(|e| ConfigError::InvalidUrl("base URL".to_string(), e.to_string()))?;
        Ok(self)
    }
}

fn default_user_agent() -> String {
    format!("tribune-client/{}", env!("CARGO_PKG_VERSION"))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL failed to parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// `TRIBUNE_TIMEOUT_SECS` is not a whole number of seconds.
    #[error("invalid TRIBUNE_TIMEOUT_SECS value: {0:?}")]
    InvalidTimeout(String),
}
