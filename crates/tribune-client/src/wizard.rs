// SPDX-License-Identifier: BUSL-1.1
//! # Onboarding Wizard Orchestrator
//!
//! Drives [`tribune_state::Wizard`] against an [`OnboardingApi`]. Every
//! handler catches its failure, logs it, releases the wizard's in-flight
//! flag, and returns a typed [`OnboardingError`] so the caller can retry
//! or cancel from the same step. Nothing here panics or retries on its own.
//!
//! Invites go out strictly one after another. The pass stops at the first
//! failure, so the ledger always reads "first N issued, then one failure,
//! then untouched".

use tribune_core::{CommunityId, Email, OtpCode, OtpInput, ValidationError};
use tribune_state::{
    AdminSession, CloseOutcome, InviteOutcome, InviteReport, Wizard, WizardDraft, WizardError,
    WizardStep,
};

use crate::communities::{Acknowledgement, Approver};
use crate::error::ApiError;
use crate::onboarding::OnboardingApi;
use crate::types::{find_user_by_email, Community, DirectoryUser};

/// Failures surfaced by the onboarding wizard.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    /// The cached session has no resolvable creator id.
    #[error("no creator session found")]
    SessionInvalid,

    /// The draft failed client-side validation. No request was made.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// The server rejected the OTP.
    #[error("invalid or expired OTP: {message}")]
    InvalidOtp {
        /// Server message.
        message: String,
    },

    /// A request failed in transport or on the server.
    #[error("request failed: {message}")]
    NetworkOrServer {
        /// Server message when available, otherwise a generic one.
        message: String,
    },

    /// Some invites went out and some did not.
    #[error(
        "invites partially sent: {} issued, {} failed, {} not attempted",
        .0.issued.len(),
        .0.failed.len(),
        .0.not_attempted.len()
    )]
    PartialInviteFailure(InviteReport),

    /// The backend rejected the session; cached auth has been cleared.
    #[error("session expired; log in again")]
    Unauthorized,

    /// The action is not valid in the wizard's current state.
    #[error(transparent)]
    Wizard(WizardError),
}

impl From<WizardError> for OnboardingError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation(v) => Self::Validation(v),
            other => Self::Wizard(other),
        }
    }
}

impl OnboardingError {
    fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => Self::Unauthorized,
            other => Self::NetworkOrServer {
                message: other.user_message(),
            },
        }
    }

    /// OTP endpoints: a 4xx means the code was wrong or stale.
    fn from_otp_api(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => Self::Unauthorized,
            other if other.is_client_error() => Self::InvalidOtp {
                message: other.user_message(),
            },
            other => Self::NetworkOrServer {
                message: other.user_message(),
            },
        }
    }
}

/// Pick the approver identity for `email`: the directory's user id when
/// the directory knows the address, otherwise the raw email.
pub fn resolve_approver(directory: &[DirectoryUser], email: &Email) -> Approver {
    match find_user_by_email(directory, email.as_str()) {
        Some(user) => Approver::User(user.id.clone()),
        None => Approver::Email(email.clone()),
    }
}

/// Async driver for one onboarding wizard.
pub struct OnboardingWizard<A> {
    api: A,
    session: AdminSession,
    wizard: Wizard,
    directory: Option<Vec<DirectoryUser>>,
    listing: Vec<Community>,
    invite_codes: Vec<(Email, OtpCode)>,
}

impl<A: OnboardingApi> OnboardingWizard<A> {
    /// Open a wizard for an admin session that passed the route guard.
    pub fn new(api: A, session: AdminSession) -> Self {
        Self {
            api,
            session,
            wizard: Wizard::new(),
            directory: None,
            listing: Vec::new(),
            invite_codes: Vec::new(),
        }
    }

    /// The underlying step machine.
    pub fn state(&self) -> &Wizard {
        &self.wizard
    }

    /// Current step.
    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    /// The backend.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The admin session the wizard runs under.
    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    /// Edit the draft before creation.
    pub fn draft_mut(&mut self) -> Result<&mut WizardDraft, OnboardingError> {
        Ok(self.wizard.draft_mut()?)
    }

    /// Community listing as of the last successful refresh.
    pub fn listing(&self) -> &[Community] {
        &self.listing
    }

    /// Invite codes echoed by a relay-mode server during this run.
    pub fn invite_codes(&self) -> &[(Email, OtpCode)] {
        &self.invite_codes
    }

    /// Hand over the echoed invite codes, leaving none behind.
    pub fn take_invite_codes(&mut self) -> Vec<(Email, OtpCode)> {
        std::mem::take(&mut self.invite_codes)
    }

    /// Step 0: create the community and branch on its type.
    pub async fn submit_basic_info(&mut self) -> Result<WizardStep, OnboardingError> {
        let creator = match self.session.creator_id() {
            Ok(id) => id.clone(),
            Err(_) => {
                tracing::warn!("cannot create community: no creator id in cached session");
                return Err(OnboardingError::SessionInvalid);
            }
        };
        let req = self.wizard.begin_creation(&creator)?;

        match self.api.create_community(&req).await {
            Ok(community) => {
                tracing::info!(
                    community_id = %community.id,
                    community_type = %community.community_type,
                    "community created in pending state"
                );
                Ok(self.wizard.record_created(community.id)?)
            }
            Err(e) => {
                self.wizard.record_failure();
                tracing::warn!(error = %e, "community creation failed");
                Err(OnboardingError::from_api(e))
            }
        }
    }

    /// Step 1: issue (or re-issue) the domain-email OTP. Returns the code
    /// when the server echoes it.
    pub async fn request_otp(&mut self) -> Result<Option<OtpCode>, OnboardingError> {
        let req = self.wizard.begin_otp_issue()?;
        match self
            .api
            .issue_email_otp(&req.community_id, &req.domain_email)
            .await
        {
            Ok(issued) => {
                tracing::info!(community_id = %req.community_id, "domain-email OTP issued");
                self.wizard.record_otp_issued(issued.otp.clone())?;
                Ok(issued.otp)
            }
            Err(e) => {
                self.wizard.record_failure();
                tracing::warn!(community_id = %req.community_id, error = %e, "OTP issuance failed");
                Err(OnboardingError::from_api(e))
            }
        }
    }

    /// Step 1: replace the OTP field with the sanitized form of `raw`.
    pub fn enter_otp(&mut self, raw: &str) -> Result<&OtpInput, OnboardingError> {
        Ok(self.wizard.enter_otp(raw)?)
    }

    /// Whether the Verify action is enabled.
    pub fn can_verify(&self) -> bool {
        self.wizard.can_verify()
    }

    /// Step 1: confirm the typed OTP. On success the community is Active
    /// and the wizard closes.
    pub async fn verify_otp(&mut self) -> Result<CloseOutcome, OnboardingError> {
        let req = self.wizard.begin_otp_confirm()?;
        match self.api.confirm_email_otp(&req.community_id, &req.otp).await {
            Ok(_) => {
                tracing::info!(community_id = %req.community_id, "domain email verified; community active");
                self.wizard.record_confirmed()?;
                Ok(self.close().await)
            }
            Err(e) => {
                self.wizard.record_failure();
                tracing::warn!(community_id = %req.community_id, error = %e, "OTP confirmation failed");
                Err(OnboardingError::from_otp_api(e))
            }
        }
    }

    /// Step 2: invite every authorized person not yet invited, in order.
    ///
    /// Returns the report when every invite is out (the wizard has then
    /// closed). A pass that issued nothing fails with `NetworkOrServer`;
    /// a pass that issued some fails with `PartialInviteFailure`.
    pub async fn send_invites(&mut self) -> Result<InviteReport, OnboardingError> {
        let batch = self.wizard.begin_invites()?;
        let mut unauthorized = false;

        for req in batch {
            match self
                .api
                .invite_authorized(&req.community_id, &req.email)
                .await
            {
                Ok(issued) => {
                    tracing::info!(community_id = %req.community_id, email = %req.email, "authorized invite issued");
                    if let Some(code) = issued.otp {
                        self.remember_invite_code(req.email.clone(), code);
                    }
                    self.wizard
                        .record_invite_outcome(&req.email, InviteOutcome::Issued)?;
                }
                Err(e) => {
                    tracing::warn!(community_id = %req.community_id, email = %req.email, error = %e, "authorized invite failed; stopping");
                    unauthorized = matches!(e, ApiError::Unauthorized { .. });
                    self.wizard.record_invite_outcome(
                        &req.email,
                        InviteOutcome::Failed {
                            reason: e.user_message(),
                        },
                    )?;
                    break;
                }
            }
        }

        let report = self.wizard.finish_invites()?;
        self.settle_invite_report(report, unauthorized).await
    }

    /// Step 2: re-run the pass over failed and never-attempted emails only.
    pub async fn retry_failed_invites(&mut self) -> Result<InviteReport, OnboardingError> {
        tracing::info!(
            pending = self.wizard.invites().pending().len(),
            "retrying failed authorized invites"
        );
        self.send_invites().await
    }

    /// Step 2: re-issue one invite. Other invites are untouched.
    pub async fn resend_invite(&mut self, email: &Email) -> Result<InviteReport, OnboardingError> {
        let req = self.wizard.begin_resend(email)?;
        let (outcome, failure) = match self
            .api
            .invite_authorized(&req.community_id, &req.email)
            .await
        {
            Ok(issued) => {
                tracing::info!(community_id = %req.community_id, email = %req.email, "authorized invite re-issued");
                if let Some(code) = issued.otp {
                    self.remember_invite_code(req.email.clone(), code);
                }
                (InviteOutcome::Issued, None)
            }
            Err(e) => {
                tracing::warn!(community_id = %req.community_id, email = %req.email, error = %e, "invite resend failed");
                (
                    InviteOutcome::Failed {
                        reason: e.user_message(),
                    },
                    Some(e),
                )
            }
        };
        let report = self.wizard.record_resend(&req.email, outcome)?;
        match failure {
            Some(e) => Err(OnboardingError::from_api(e)),
            None => {
                if report.is_complete() {
                    self.close().await;
                }
                Ok(report)
            }
        }
    }

    /// Approve one authorized invite on behalf of `email`.
    ///
    /// The approver is the directory user with that address when one
    /// exists, otherwise the raw email. The directory is fetched once and
    /// reused; if it cannot be fetched the raw email is used.
    pub async fn approve_invite(
        &mut self,
        community_id: &CommunityId,
        email: &Email,
        otp: &OtpCode,
    ) -> Result<Acknowledgement, OnboardingError> {
        let approver = self.resolve(email).await;
        match self
            .api
            .approve_authorized(community_id, &approver, otp)
            .await
        {
            Ok(ack) => {
                tracing::info!(
                    community_id = %community_id,
                    email = %email,
                    approvals = ?ack.approvals,
                    status = ?ack.status,
                    "authorized invite approved"
                );
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(community_id = %community_id, email = %email, error = %e, "approval failed");
                Err(OnboardingError::from_otp_api(e))
            }
        }
    }

    /// Close the wizard from any step and refresh the listing.
    ///
    /// No compensating request is made: a community created by an
    /// unfinished run stays Pending and is reported as orphaned.
    pub async fn close(&mut self) -> CloseOutcome {
        let outcome = self.wizard.close();
        if let Some(id) = outcome.orphaned() {
            tracing::warn!(community_id = %id, "wizard closed before verification; community left pending");
        }
        match self.api.list_communities().await {
            Ok(list) => self.listing = list,
            Err(e) => tracing::warn!(error = %e, "listing refresh failed"),
        }
        outcome
    }

    async fn resolve(&mut self, email: &Email) -> Approver {
        if self.directory.is_none() {
            match self.api.directory().await {
                Ok(users) => self.directory = Some(users),
                Err(e) => {
                    tracing::warn!(error = %e, "user directory unavailable; approving by email");
                }
            }
        }
        resolve_approver(self.directory.as_deref().unwrap_or_default(), email)
    }

    fn remember_invite_code(&mut self, email: Email, code: OtpCode) {
        self.invite_codes.retain(|(e, _)| e != &email);
        self.invite_codes.push((email, code));
    }

    async fn settle_invite_report(
        &mut self,
        report: InviteReport,
        unauthorized: bool,
    ) -> Result<InviteReport, OnboardingError> {
        if report.is_complete() {
            self.close().await;
            return Ok(report);
        }
        if unauthorized {
            return Err(OnboardingError::Unauthorized);
        }
        if report.is_total_failure() {
            let message = report
                .first_failure()
                .map(|f| f.reason.clone())
                .unwrap_or_else(|| "failed to send invitations".to_string());
            return Err(OnboardingError::NetworkOrServer { message });
        }
        Err(OnboardingError::PartialInviteFailure(report))
    }
}
