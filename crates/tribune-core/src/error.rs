// SPDX-License-Identifier: BUSL-1.1
//! # Error Hierarchy
//!
//! Structured error types shared by the whole stack, built with `thiserror`.
//! Validation failures carry the offending input so that an operator can
//! see what was rejected without re-running the request.

use thiserror::Error;

/// Top-level error type for core operations.
#[derive(Error, Debug)]
pub enum TribuneError {
    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record is valid JSON but not a JSON object.
    #[error("malformed {0} record: expected a JSON object")]
    MalformedRecord(&'static str),
}

/// Client-side guard failures.
///
/// Every variant is raised before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Community name is empty or whitespace-only.
    #[error("community name must be non-empty")]
    EmptyName,

    /// A single-creator community was submitted without a domain email.
    #[error("a domain email is required for single-creator communities")]
    MissingDomainEmail,

    /// Email address is not syntactically valid.
    #[error("invalid email address: \"{0}\"")]
    InvalidEmail(String),

    /// A multi-user community lists fewer authorized persons than required.
    #[error("at least {required} authorized persons are required, got {provided}")]
    TooFewAuthorizedPersons {
        /// Minimum number of authorized persons.
        required: usize,
        /// Number of non-empty entries provided.
        provided: usize,
    },

    /// The same authorized person appears twice.
    #[error("authorized person listed more than once: {0}")]
    DuplicateAuthorizedPerson(String),

    /// A post was submitted without content.
    #[error("post content must be non-empty")]
    EmptyPostContent,

    /// OTP is not exactly six ASCII digits.
    #[error("invalid OTP: \"{0}\" (expected exactly 6 digits)")]
    InvalidOtp(String),

    /// An opaque identifier is empty.
    #[error("invalid {kind} identifier: \"{value}\"")]
    InvalidIdentifier {
        /// Which identifier kind was rejected ("community", "user").
        kind: &'static str,
        /// The rejected raw value.
        value: String,
    },
}
