// SPDX-License-Identifier: BUSL-1.1
//! # Community Enums
//!
//! Wire names match the backend exactly (`"Single"`, `"Multi"`,
//! `"Pending"`, `"Active"`, and the post audiences `"Public"`, `"Member"`,
//! `"Event"`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a community proves control before activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommunityType {
    /// Single creator; activated by one confirmed domain-email OTP.
    #[default]
    Single,
    /// Multi-user; activated once enough authorized persons approve.
    Multi,
}

impl CommunityType {
    /// The wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Multi => "Multi",
        }
    }
}

impl fmt::Display for CommunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a community. No other states are in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommunityStatus {
    /// Created, verification not yet complete.
    #[default]
    Pending,
    /// Verification complete.
    Active,
}

impl CommunityStatus {
    /// The wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
        }
    }
}

impl fmt::Display for CommunityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience of a community post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PostType {
    /// Visible to all followers.
    #[default]
    Public,
    /// Visible to members only.
    Member,
    /// Paid event post.
    Event,
}

impl PostType {
    /// The wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Member => "Member",
            Self::Event => "Event",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
