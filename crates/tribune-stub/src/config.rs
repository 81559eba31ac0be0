// SPDX-License-Identifier: BUSL-1.1
//! Stub server configuration, read from the environment.

use chrono::Duration;
use tribune_core::Email;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8090;
/// Default seeded admin login.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@tribune.local";
/// Default seeded admin password.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
/// Lifetime of an issued OTP.
pub const DEFAULT_OTP_TTL_SECS: i64 = 600;
/// Longest accepted OTP lifetime: one day.
pub const MAX_OTP_TTL_SECS: i64 = 86_400;

/// Errors loading [`StubConfig`].
#[derive(Debug, thiserror::Error)]
pub enum StubConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Runtime settings for the stub.
#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Listen port.
    pub port: u16,
    /// Email of the seeded admin user. Validated when the state is built.
    pub admin_email: String,
    /// Password of the seeded admin user.
    pub admin_password: String,
    /// OTP lifetime in seconds. Zero makes every code expire immediately.
    /// Values outside `0..=MAX_OTP_TTL_SECS` are clamped when the state is
    /// built.
    pub otp_ttl_secs: i64,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            otp_ttl_secs: DEFAULT_OTP_TTL_SECS,
        }
    }
}

impl StubConfig {
    /// Load from the environment.
    ///
    /// Variables:
    /// - `TRIBUNE_STUB_PORT` (default: `8090`)
    /// - `TRIBUNE_STUB_ADMIN_EMAIL` (default: `admin@tribune.local`)
    /// - `TRIBUNE_STUB_ADMIN_PASSWORD` (default: `admin`)
    /// - `TRIBUNE_STUB_OTP_TTL_SECS` (default: `600`)
    pub fn from_env() -> Result<Self, StubConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("TRIBUNE_STUB_PORT") {
            config.port = raw.trim().parse().map_err(|_| StubConfigError::Invalid {
                var: "TRIBUNE_STUB_PORT",
                value: raw.clone(),
            })?;
        }
        if let Ok(raw) = std::env::var("TRIBUNE_STUB_ADMIN_EMAIL") {
            Email::new(raw.as_str()).map_err(|_| StubConfigError::Invalid {
                var: "TRIBUNE_STUB_ADMIN_EMAIL",
                value: raw.clone(),
            })?;
            config.admin_email = raw;
        }
        if let Ok(raw) = std::env::var("TRIBUNE_STUB_ADMIN_PASSWORD") {
            config.admin_password = raw;
        }
        if let Ok(raw) = std::env::var("TRIBUNE_STUB_OTP_TTL_SECS") {
            config.otp_ttl_secs = parse_otp_ttl(&raw)?;
        }
        Ok(config)
    }

    /// The OTP lifetime, clamped to `0..=MAX_OTP_TTL_SECS`.
    pub fn otp_ttl(&self) -> Duration {
        let secs = self.otp_ttl_secs.clamp(0, MAX_OTP_TTL_SECS);
        if secs != self.otp_ttl_secs {
            tracing::warn!(
                requested = self.otp_ttl_secs,
                applied = secs,
                "OTP lifetime out of range; clamped"
            );
        }
        Duration::seconds(secs)
    }
}

/// Parse `TRIBUNE_STUB_OTP_TTL_SECS`: whole seconds in `0..=MAX_OTP_TTL_SECS`.
fn parse_otp_ttl(raw: &str) -> Result<i64, StubConfigError> {
    raw.trim()
        .parse()
        .ok()
        .filter(|secs: &i64| (0..=MAX_OTP_TTL_SECS).contains(secs))
        .ok_or_else(|| StubConfigError::Invalid {
            var: "TRIBUNE_STUB_OTP_TTL_SECS",
            value: raw.to_string(),
        })
}
