// SPDX-License-Identifier: BUSL-1.1
//! # Identity-Normalized Response Types
//!
//! The backend is inconsistent about identifier field names: most records
//! carry `_id`, some carry `id`. Every identity-bearing response passes
//! through a raw struct that accepts both and a `TryFrom` conversion that
//! keeps exactly one canonical `id`. A record with neither is rejected at
//! the API boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribune_core::{
    pick_identifier, CommunityId, CommunityStatus, CommunityType, PostId, PostType, Role, UserId,
    ValidationError,
};

/// A community as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCommunity", rename_all = "camelCase")]
pub struct Community {
    /// Canonical identifier.
    #[serde(rename = "_id")]
    pub id: CommunityId,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Single or Multi. Never changes after creation.
    #[serde(rename = "type")]
    pub community_type: CommunityType,
    /// Pending or Active.
    pub status: CommunityStatus,
    /// Image reference.
    pub image: String,
    /// Domain email (Single).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_email: Option<String>,
    /// Authorized persons (Multi).
    pub authorized_persons: Vec<String>,
    /// Creator user id, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Approved authorized invites so far.
    pub approvals: u32,
    /// Member user ids.
    pub members: Vec<String>,
    /// Member count. Falls back to the length of `members`.
    pub members_count: u32,
    /// User ids waiting for a join decision.
    pub join_requests: Vec<String>,
    /// Creation time, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommunity {
    #[serde(rename = "_id", default)]
    underscore_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    community_type: CommunityType,
    #[serde(default)]
    status: CommunityStatus,
    #[serde(default)]
    image: String,
    #[serde(default)]
    domain_email: Option<String>,
    #[serde(default)]
    authorized_persons: Vec<String>,
    #[serde(default)]
    creator: Option<String>,
    #[serde(default)]
    approvals: u32,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    members_count: Option<u32>,
    #[serde(default)]
    join_requests: Vec<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawCommunity> for Community {
    type Error = ValidationError;

    fn try_from(raw: RawCommunity) -> Result<Self, Self::Error> {
        let id = pick_identifier(raw.underscore_id, raw.id).unwrap_or_default();
        Ok(Self {
            id: CommunityId::new(id)?,
            name: raw.name,
            description: raw.description,
            community_type: raw.community_type,
            status: raw.status,
            image: raw.image,
            domain_email: raw.domain_email,
            authorized_persons: raw.authorized_persons,
            creator: raw.creator,
            approvals: raw.approvals,
            members_count: raw
                .members_count
                .unwrap_or_else(|| u32::try_from(raw.members.len()).unwrap_or(u32::MAX)),
            members: raw.members,
            join_requests: raw.join_requests,
            created_at: raw.created_at,
        })
    }
}

/// A community post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPost", rename_all = "camelCase")]
pub struct Post {
    /// Canonical identifier.
    #[serde(rename = "_id")]
    pub id: PostId,
    /// Owning community, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<String>,
    /// Body text.
    pub content: String,
    /// Audience.
    #[serde(rename = "type")]
    pub post_type: PostType,
    /// Display name of the author.
    pub author_name: String,
    /// Like count.
    pub likes: u32,
    /// Share count.
    pub shares: u32,
    /// Number of comments.
    pub comment_count: usize,
    /// Creation time, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPost {
    #[serde(rename = "_id", default)]
    underscore_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    community_id: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(rename = "type", default)]
    post_type: PostType,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    likes: u32,
    #[serde(default)]
    shares: u32,
    #[serde(default)]
    comments: Vec<serde_json::Value>,
    #[serde(default)]
    comment_count: Option<usize>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawPost> for Post {
    type Error = ValidationError;

    fn try_from(raw: RawPost) -> Result<Self, Self::Error> {
        let id = pick_identifier(raw.underscore_id, raw.id).unwrap_or_default();
        Ok(Self {
            id: PostId::new(id)?,
            community_id: raw.community_id,
            content: raw.content,
            post_type: raw.post_type,
            author_name: raw.author_name,
            likes: raw.likes,
            shares: raw.shares,
            comment_count: raw.comment_count.unwrap_or(raw.comments.len()),
            created_at: raw.created_at,
        })
    }
}

/// An entry of the user directory (`GET /users`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDirectoryUser")]
pub struct DirectoryUser {
    /// Canonical identifier.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Email address as stored.
    pub email: String,
    /// Display name.
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Role.
    pub role: Role,
}

#[derive(Deserialize)]
struct RawDirectoryUser {
    #[serde(rename = "_id", default)]
    underscore_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: String,
    #[serde(rename = "fullName", default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Role,
}

impl TryFrom<RawDirectoryUser> for DirectoryUser {
    type Error = ValidationError;

    fn try_from(raw: RawDirectoryUser) -> Result<Self, Self::Error> {
        let id = pick_identifier(raw.underscore_id, raw.id).unwrap_or_default();
        Ok(Self {
            id: UserId::new(id)?,
            email: raw.email,
            full_name: raw.full_name.or(raw.name),
            role: raw.role,
        })
    }
}

/// Find the directory entry for `email`, ignoring case and whitespace.
pub fn find_user_by_email<'a>(
    directory: &'a [DirectoryUser],
    email: &str,
) -> Option<&'a DirectoryUser> {
    let wanted = email.trim();
    directory
        .iter()
        .find(|u| u.email.trim().eq_ignore_ascii_case(wanted))
}
