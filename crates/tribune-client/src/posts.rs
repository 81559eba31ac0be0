// SPDX-License-Identifier: BUSL-1.1
//! Typed client for community posts.
//!
//! ## Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/communities/{id}/posts` | Posts of one community |
//! | POST   | `/communities/posts` | Create a post |
//! | PATCH  | `/communities/posts/{id}/like` | Like a post |
//! | PATCH  | `/communities/posts/{id}/share` | Share a post |

use tribune_core::{CommunityId, PostId};
use tribune_state::NewPost;

use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::Post;

/// Client for the post endpoints.
#[derive(Debug, Clone)]
pub struct PostClient {
    transport: Transport,
}

impl PostClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Posts of one community, as ordered by the server.
    ///
    /// Calls `GET {base_url}/communities/{id}/posts`.
    pub async fn list(&self, community_id: &CommunityId) -> Result<Vec<Post>, ApiError> {
        let endpoint = format!("GET /communities/{community_id}/posts");
        let resp = self
            .transport
            .send(
                self.transport
                    .get(&["communities", community_id.as_str(), "posts"])?,
                &endpoint,
            )
            .await?;
        Transport::decode(resp, &endpoint).await
    }

    /// Create a post. Build `post` with [`NewPost::compose`], which fails
    /// without a session identity.
    ///
    /// Calls `POST {base_url}/communities/posts`.
    pub async fn create(&self, post: &NewPost) -> Result<Post, ApiError> {
        let endpoint = "POST /communities/posts";
        let resp = self
            .transport
            .send(
                self.transport.post(&["communities", "posts"])?.json(post),
                endpoint,
            )
            .await?;
        let created: Post = Transport::decode(resp, endpoint).await?;
        tracing::info!(post_id = %created.id, community_id = %post.community_id, "post created");
        Ok(created)
    }

    /// Like a post.
    ///
    /// Calls `PATCH {base_url}/communities/posts/{id}/like`.
    pub async fn like(&self, id: &PostId) -> Result<(), ApiError> {
        self.bump(id, "like").await
    }

    /// Share a post.
    ///
    /// Calls `PATCH {base_url}/communities/posts/{id}/share`.
    pub async fn share(&self, id: &PostId) -> Result<(), ApiError> {
        self.bump(id, "share").await
    }

    async fn bump(&self, id: &PostId, action: &str) -> Result<(), ApiError> {
        let endpoint = format!("PATCH /communities/posts/{id}/{action}");
        self.transport
            .send(
                self.transport
                    .patch(&["communities", "posts", id.as_str(), action])?,
                &endpoint,
            )
            .await?;
        Ok(())
    }
}
