// SPDX-License-Identifier: BUSL-1.1
//! # Stub Error Type
//!
//! Every failure answers `{"message": "..."}`, the shape the admin console
//! reads its error text from.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use tribune_core::ValidationError;

/// Handler error that renders as a JSON `message` body.
#[derive(Error, Debug)]
pub enum StubError {
    /// Malformed or semantically invalid request (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or unknown bearer token (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Conflicts with the resource's current state (409).
    #[error("{0}")]
    Conflict(String),

    /// Internal failure (500). The detail is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StubError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 400 for a code that does not match a live ticket.
    pub fn invalid_otp() -> Self {
        Self::BadRequest("Invalid or expired OTP".to_string())
    }

    /// 404 for a missing community.
    pub fn community_not_found() -> Self {
        Self::NotFound("Community not found".to_string())
    }
}

impl From<ValidationError> for StubError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal stub error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: StubError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn renders_message_body() {
        let (status, body) = render(StubError::invalid_otp()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid or expired OTP");
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let (status, body) = render(StubError::Internal("lock poisoned".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn validation_errors_are_400() {
        let (status, _) = render(ValidationError::EmptyName.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
