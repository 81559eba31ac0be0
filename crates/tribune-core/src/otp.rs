// SPDX-License-Identifier: BUSL-1.1
//! # One-Time Passcodes
//!
//! [`OtpCode`] is a validated six-digit code. [`OtpInput`] is the editable
//! field an operator types into: every edit keeps ASCII digits only and
//! bounds the value to [`OTP_LENGTH`] characters, so the verify action can
//! only be enabled once exactly six digits are present.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of digits in every OTP.
pub const OTP_LENGTH: usize = 6;

/// A six-digit one-time passcode.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OtpCode(String);

impl OtpCode {
    /// Validate a code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidOtp`] unless the input is exactly
    /// six ASCII digits. No sanitization happens here; use [`OtpInput`]
    /// for operator-typed text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.len() != OTP_LENGTH || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidOtp(value));
        }
        Ok(Self(value))
    }

    /// Build a code from an integer in `0..1_000_000`, zero-padded.
    ///
    /// Values outside the range wrap modulo one million.
    pub fn from_number(n: u32) -> Self {
        Self(format!("{:06}", n % 1_000_000))
    }

    /// Access the digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Codes are credentials; keep them out of debug logs.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OtpCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Sanitizing text field for OTP entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpInput {
    digits: String,
}

impl OtpInput {
    /// An empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the field contents with the sanitized form of `raw`.
    pub fn set(&mut self, raw: &str) {
        self.digits = sanitize(raw);
    }

    /// Append typed text, sanitizing the combined value.
    pub fn push_str(&mut self, raw: &str) {
        let combined = format!("{}{}", self.digits, raw);
        self.digits = sanitize(&combined);
    }

    /// Clear the field.
    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// The sanitized digits currently held.
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Number of digits held.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Whether the field is empty.
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Whether exactly [`OTP_LENGTH`] digits are present.
    pub fn is_complete(&self) -> bool {
        self.digits.len() == OTP_LENGTH
    }

    /// The code, only when the input is complete.
    pub fn to_code(&self) -> Option<OtpCode> {
        if self.is_complete() {
            OtpCode::new(self.digits.clone()).ok()
        } else {
            None
        }
    }
}

/// Keep ASCII digits only, truncated to [`OTP_LENGTH`].
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(OTP_LENGTH)
        .collect()
}
