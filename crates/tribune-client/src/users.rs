// SPDX-License-Identifier: BUSL-1.1
//! Typed client for the user directory (`GET /users`).

use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::DirectoryUser;

/// Client for the user directory.
#[derive(Debug, Clone)]
pub struct UserClient {
    transport: Transport,
}

impl UserClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Fetch the full user directory.
    ///
    /// Calls `GET {base_url}/users`.
    pub async fn directory(&self) -> Result<Vec<DirectoryUser>, ApiError> {
        let endpoint = "GET /users";
        let resp = self
            .transport
            .send(self.transport.get(&["users"])?, endpoint)
            .await?;
        Transport::decode(resp, endpoint).await
    }
}
