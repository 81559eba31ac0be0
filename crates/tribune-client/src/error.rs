// SPDX-License-Identifier: BUSL-1.1
//! Tribune API client error types.

/// Errors from Tribune API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Endpoint label, e.g. `POST /communities`.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The server rejected the bearer token. Cached auth state has been
    /// cleared; the caller should send the operator to login.
    #[error("{endpoint} returned 401: session expired or invalid")]
    Unauthorized {
        /// Endpoint label.
        endpoint: String,
    },
    /// The server returned a non-2xx status other than 401.
    #[error("{endpoint} returned {status}: {message}")]
    Api {
        /// Endpoint label.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided `message`, or a generic description.
        message: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Endpoint label.
        endpoint: String,
        /// Underlying decode error.
        source: reqwest::Error,
    },
    /// The session could not be written after login.
    #[error("session store error: {0}")]
    Session(#[from] tribune_core::TribuneError),
    /// An identifier cannot be used as a URL path segment.
    #[error("identifier {0:?} cannot be used in a request path")]
    InvalidPathSegment(String),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ApiError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the request as a client error.
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// The message to surface to an operator: the server's message when it
    /// sent one, otherwise the error's own description.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
