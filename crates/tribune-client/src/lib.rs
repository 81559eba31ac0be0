// SPDX-License-Identifier: BUSL-1.1
//! # tribune-client -- Typed Rust client for the Tribune community backend
//!
//! Provides typed access to the endpoints the admin console uses:
//! - **Auth** via `/users/login`
//! - **Users** via `/users` (the directory used to resolve approvers)
//! - **Communities** via `/communities`, its verification sub-paths and
//!   join-request decisions
//! - **Posts** via `/communities/posts` and `/communities/{id}/posts`
//!
//! Plus the [`OnboardingWizard`], which drives the `tribune-state` wizard
//! through the [`OnboardingApi`] seam.
//!
//! ## Session Handling
//!
//! The client shares a [`SessionStore`] with the route guard. Every request
//! attaches `Authorization: Bearer <token>` from the store, and a 401 from
//! any endpoint purges the cached session before surfacing
//! [`ApiError::Unauthorized`].

pub mod auth;
pub mod communities;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod posts;
pub(crate) mod transport;
pub mod types;
pub mod users;
pub mod wizard;

pub use communities::{
    Acknowledgement, Approver, CommunityFilter, DiscardOutcome, JoinDecision, OtpIssued,
};
pub use config::TribuneApiConfig;
pub use error::ApiError;
pub use onboarding::OnboardingApi;
pub use posts::PostClient;
pub use types::{Community, DirectoryUser, Post};
pub use wizard::{resolve_approver, OnboardingError, OnboardingWizard};

use std::sync::Arc;

use tribune_core::SessionStore;

/// Top-level Tribune API client. Holds sub-clients for each resource.
#[derive(Debug, Clone)]
pub struct TribuneClient {
    auth: auth::AuthClient,
    users: users::UserClient,
    communities: communities::CommunityClient,
    posts: posts::PostClient,
}

impl TribuneClient {
    /// Create a new client from configuration and a shared session store.
    pub fn new(config: TribuneApiConfig, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let transport = transport::Transport::new(&config, session)?;
        Ok(Self {
            auth: auth::AuthClient::new(transport.clone()),
            users: users::UserClient::new(transport.clone()),
            communities: communities::CommunityClient::new(transport.clone()),
            posts: posts::PostClient::new(transport),
        })
    }

    /// Access the auth client.
    pub fn auth(&self) -> &auth::AuthClient {
        &self.auth
    }

    /// Access the user-directory client.
    pub fn users(&self) -> &users::UserClient {
        &self.users
    }

    /// Access the communities client.
    pub fn communities(&self) -> &communities::CommunityClient {
        &self.communities
    }

    /// Access the posts client.
    pub fn posts(&self) -> &posts::PostClient {
        &self.posts
    }
}
