// SPDX-License-Identifier: BUSL-1.1
//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers and addresses.
//!
//! ## Validation
//!
//! Backend identifiers are opaque: the only rule is non-emptiness, so that
//! an unset id never masquerades as a real one. [`Email`] is trimmed,
//! lower-cased and checked for a `local@domain.tld` shape at construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Routes `Deserialize` through the type's `new()` constructor so that
/// invalid values are rejected at deserialization time.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $ty:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $ty(String);

        impl $ty {
            /// Create an identifier, rejecting empty or whitespace-only input.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::InvalidIdentifier`] for empty input.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::InvalidIdentifier {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Access the raw identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl_validating_deserialize!($ty);
    };
}

opaque_id!(
    /// Identifier of a community, assigned by the backend at creation.
    CommunityId,
    "community"
);

opaque_id!(
    /// Identifier of a user in the backend's user directory.
    UserId,
    "user"
);

opaque_id!(
    /// Identifier of a community post.
    PostId,
    "post"
);

/// Pick the canonical identifier from the two shapes the backend emits.
///
/// Some responses carry `_id`, others `id`. The first non-blank value wins,
/// so callers pass the preferred field first.
pub fn pick_identifier(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .into_iter()
        .chain(fallback)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// A normalized email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEmail`] unless the trimmed input has
    /// exactly one `@`, a non-empty local part, no whitespace, and a domain
    /// with at least two non-empty dot-separated labels.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        if !is_valid_email(&normalized) {
            return Err(ValidationError::InvalidEmail(raw));
        }
        Ok(Self(normalized))
    }

    /// Access the normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The domain part of the address.
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl_validating_deserialize!(Email);

fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
