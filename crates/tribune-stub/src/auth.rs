// SPDX-License-Identifier: BUSL-1.1
//! Bearer-token authentication middleware.
//!
//! Tokens are opaque strings minted by `POST /users/login`. A request with
//! no `Authorization: Bearer` header, or with a token the store does not
//! know, is rejected with 401 before it reaches a handler.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use tribune_core::UserId;

use crate::error::StubError;
use crate::store::AppState;

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct Caller(pub UserId);

/// Reject requests without a known bearer token.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StubError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return Err(StubError::Unauthorized("Authorization token missing".into()));
    };
    let Some(user) = state.token_owner(token) else {
        tracing::debug!("rejected unknown bearer token");
        return Err(StubError::Unauthorized("Invalid or expired token".into()));
    };

    req.extensions_mut().insert(Caller(user));
    Ok(next.run(req).await)
}
