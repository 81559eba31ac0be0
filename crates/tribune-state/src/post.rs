// SPDX-License-Identifier: BUSL-1.1
//! # Post Composer
//!
//! Builds the `POST /communities/posts` body for the admin posting into a
//! community. Like community creation, posting needs a user id from the
//! cached session; a session without one fails with [`SessionInvalid`]
//! before anything is sent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tribune_core::{CommunityId, PostType, UserId, ValidationError};

use crate::guard::{AdminSession, SessionInvalid};

/// Why a post could not be composed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    /// The cached session has no user id.
    #[error(transparent)]
    SessionInvalid(#[from] SessionInvalid),
    /// The post itself is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// `POST /communities/posts` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    /// Target community.
    pub community_id: CommunityId,
    /// Trimmed, non-empty body text.
    pub content: String,
    /// Audience.
    #[serde(rename = "type")]
    pub post_type: PostType,
    /// Name shown on the post.
    pub author_name: String,
    /// Posting user.
    pub user_id: UserId,
}

impl NewPost {
    /// Compose a post by the admin in `session`.
    ///
    /// The session is checked first, so a missing identity is reported even
    /// when the content is also empty.
    pub fn compose(
        session: &AdminSession,
        community_id: CommunityId,
        content: &str,
        post_type: PostType,
    ) -> Result<Self, PostError> {
        let user_id = session.creator_id()?.clone();
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyPostContent.into());
        }
        Ok(Self {
            community_id,
            content: content.to_string(),
            post_type,
            author_name: session.display_name().to_string(),
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribune_core::{CachedUser, Role};

    fn session(id: Option<&str>) -> AdminSession {
        AdminSession::new(CachedUser {
            id: id.map(|s| UserId::new(s).unwrap()),
            role: Role::Admin,
            full_name: Some("Ada".into()),
            email: None,
        })
    }

    fn cid() -> CommunityId {
        CommunityId::new("c1").unwrap()
    }

    #[test]
    fn compose_fills_author_from_session() {
        let post = NewPost::compose(&session(Some("u1")), cid(), "  Hello  ", PostType::Member).unwrap();
        assert_eq!(post.content, "Hello");
        assert_eq!(post.author_name, "Ada");
        assert_eq!(post.user_id.as_str(), "u1");

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["communityId"], "c1");
        assert_eq!(json["type"], "Member");
        assert_eq!(json["authorName"], "Ada");
        assert_eq!(json["userId"], "u1");
    }

    #[test]
    fn session_without_id_cannot_post() {
        assert_eq!(
            NewPost::compose(&session(None), cid(), "Hello", PostType::Public),
            Err(PostError::SessionInvalid(SessionInvalid))
        );
        // Identity is checked before content.
        assert_eq!(
            NewPost::compose(&session(None), cid(), "", PostType::Public),
            Err(PostError::SessionInvalid(SessionInvalid))
        );
    }

    #[test]
    fn blank_content_is_rejected() {
        assert_eq!(
            NewPost::compose(&session(Some("u1")), cid(), " \n ", PostType::Public),
            Err(PostError::Validation(ValidationError::EmptyPostContent))
        );
    }
}
