// SPDX-License-Identifier: BUSL-1.1
//! Login and logout.
//!
//! `POST /users/login` answers `{ "token": ..., "user": { ... } }`. A
//! successful login writes the token, the authentication flag and the user
//! record into the session store in one step.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use tribune_core::{clear_auth, store_login, CachedUser, Email};

use crate::error::ApiError;
use crate::transport::Transport;

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a Email,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: CachedUser,
}

/// Client for authentication.
#[derive(Debug, Clone)]
pub struct AuthClient {
    transport: Transport,
}

impl AuthClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Log in and cache the session. Returns the cached user.
    ///
    /// Calls `POST {base_url}/users/login`. The role is not checked here;
    /// the route guard rejects non-admin sessions on first use.
    pub async fn login(&self, email: &Email, password: &str) -> Result<CachedUser, ApiError> {
        let endpoint = "POST /users/login";
        let body = LoginBody { email, password };
        let resp = self
            .transport
            .send(self.transport.post(&["users", "login"])?.json(&body), endpoint)
            .await?;
        let LoginResponse { token, user } = Transport::decode(resp, endpoint).await?;
        let token = Zeroizing::new(token);

        store_login(self.transport.session().as_ref(), &token, &user)?;
        tracing::info!(role = ?user.role, "login succeeded");
        Ok(user)
    }

    /// Drop the cached session. No request is made.
    pub fn logout(&self) {
        clear_auth(self.transport.session().as_ref());
        tracing::info!("logged out");
    }
}
