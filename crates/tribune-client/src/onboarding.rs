// SPDX-License-Identifier: BUSL-1.1
//! # Onboarding API Seam
//!
//! The subset of backend operations the onboarding wizard needs, as a
//! trait. [`TribuneClient`] implements it over HTTP; tests implement it
//! with in-memory fakes so that the orchestration logic can be exercised
//! without a server.

use std::future::Future;

use tribune_core::{CommunityId, Email, OtpCode};
use tribune_state::NewCommunity;

use crate::communities::{Acknowledgement, Approver, OtpIssued};
use crate::error::ApiError;
use crate::types::{Community, DirectoryUser};
use crate::TribuneClient;

/// Backend operations used by [`crate::OnboardingWizard`].
///
/// Implementations must be `Send + Sync` and return `Send` futures so a
/// wizard can run on a multi-threaded runtime.
pub trait OnboardingApi: Send + Sync {
    /// `POST /communities`.
    fn create_community(
        &self,
        req: &NewCommunity,
    ) -> impl Future<Output = Result<Community, ApiError>> + Send;

    /// `POST /communities/verify-email/send`.
    fn issue_email_otp(
        &self,
        community_id: &CommunityId,
        domain_email: &Email,
    ) -> impl Future<Output = Result<OtpIssued, ApiError>> + Send;

    /// `POST /communities/verify-email/confirm`.
    fn confirm_email_otp(
        &self,
        community_id: &CommunityId,
        otp: &OtpCode,
    ) -> impl Future<Output = Result<Acknowledgement, ApiError>> + Send;

    /// `POST /communities/{id}/invite-authorized`.
    fn invite_authorized(
        &self,
        community_id: &CommunityId,
        email: &Email,
    ) -> impl Future<Output = Result<OtpIssued, ApiError>> + Send;

    /// `POST /communities/authorized/approve`.
    fn approve_authorized(
        &self,
        community_id: &CommunityId,
        approver: &Approver,
        otp: &OtpCode,
    ) -> impl Future<Output = Result<Acknowledgement, ApiError>> + Send;

    /// `GET /communities`.
    fn list_communities(&self) -> impl Future<Output = Result<Vec<Community>, ApiError>> + Send;

    /// `GET /users`.
    fn directory(&self) -> impl Future<Output = Result<Vec<DirectoryUser>, ApiError>> + Send;
}

impl OnboardingApi for TribuneClient {
    async fn create_community(&self, req: &NewCommunity) -> Result<Community, ApiError> {
        self.communities().create(req).await
    }

    async fn issue_email_otp(
        &self,
        community_id: &CommunityId,
        domain_email: &Email,
    ) -> Result<OtpIssued, ApiError> {
        self.communities()
            .send_email_otp(community_id, domain_email)
            .await
    }

    async fn confirm_email_otp(
        &self,
        community_id: &CommunityId,
        otp: &OtpCode,
    ) -> Result<Acknowledgement, ApiError> {
        self.communities().confirm_email_otp(community_id, otp).await
    }

    async fn invite_authorized(
        &self,
        community_id: &CommunityId,
        email: &Email,
    ) -> Result<OtpIssued, ApiError> {
        self.communities()
            .invite_authorized(community_id, email)
            .await
    }

    async fn approve_authorized(
        &self,
        community_id: &CommunityId,
        approver: &Approver,
        otp: &OtpCode,
    ) -> Result<Acknowledgement, ApiError> {
        self.communities()
            .approve_authorized(community_id, approver, otp)
            .await
    }

    async fn list_communities(&self) -> Result<Vec<Community>, ApiError> {
        self.communities().list().await
    }

    async fn directory(&self) -> Result<Vec<DirectoryUser>, ApiError> {
        self.users().directory().await
    }
}
