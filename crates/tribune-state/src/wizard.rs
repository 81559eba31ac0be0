// SPDX-License-Identifier: BUSL-1.1
//! # Community Onboarding Wizard
//!
//! The step machine behind community creation. It is synchronous and does
//! no I/O: each network-bound action is split into a `begin_*` call that
//! checks the guard and yields the request to send, and a `record_*` call
//! that applies the server's answer. The async orchestrator in
//! `tribune-client` sits between the two.
//!
//! ## Steps
//!
//! ```text
//! BasicInfo (0) ──▶ EmailVerification (1) ──▶ Closed (Activated)      [Single]
//!       │
//!       └────────▶ AuthorizedInvites (2) ───▶ Closed (InvitesSent)    [Multi]
//!
//! close() from any step ──▶ BasicInfo with an empty draft
//! ```
//!
//! ## Invariants
//!
//! - No verification request can be built without a created community id.
//! - The community type is frozen once the community exists.
//! - A failed OTP confirmation leaves step, id and OTP input unchanged.
//! - `close()` always restores the initial state.

use chrono::{DateTime, Utc};
use thiserror::Error;

use tribune_core::{CommunityId, CommunityType, Email, OtpCode, OtpInput, UserId, ValidationError};

use crate::draft::{NewCommunity, VerificationTarget, WizardDraft};
use crate::invites::{InviteLedger, InviteOutcome, InviteReport};

// ─── Steps ───────────────────────────────────────────────────────────

/// Position of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    /// Step 0: name, description, type, image and verification target.
    BasicInfo,
    /// Step 1: domain-email OTP (Single only).
    EmailVerification,
    /// Step 2: authorized-person invites (Multi only).
    AuthorizedInvites,
    /// The flow finished and is waiting to be closed.
    Closed,
}

impl WizardStep {
    /// Numeric step code for the live steps.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::BasicInfo => Some(0),
            Self::EmailVerification => Some(1),
            Self::AuthorizedInvites => Some(2),
            Self::Closed => None,
        }
    }

    /// Whether the flow has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Stable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicInfo => "BASIC_INFO",
            Self::EmailVerification => "EMAIL_VERIFICATION",
            Self::AuthorizedInvites => "AUTHORIZED_INVITES",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finished flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    /// Single: OTP confirmed, community Active.
    Activated,
    /// Multi: every invite issued, community Pending until approvals.
    InvitesSent,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Rejected wizard actions. None of these leave the wizard modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// A verification action was attempted before the community exists.
    #[error("no community has been created yet")]
    NotCreated,

    /// The action does not belong to the current step.
    #[error("{operation} is not allowed at step {step}")]
    WrongStep {
        /// Current step.
        step: WizardStep,
        /// Attempted action.
        operation: &'static str,
    },

    /// The community type cannot change after creation.
    #[error("community type is frozen after creation")]
    TypeFrozen,

    /// A request is already in flight.
    #[error("a request is already in progress")]
    Busy,

    /// Verify was attempted without exactly six digits.
    #[error("OTP input must contain exactly 6 digits")]
    OtpIncomplete,

    /// The email is not one of this community's authorized persons.
    #[error("{0} is not an authorized person of this community")]
    UnknownInvite(String),

    /// The draft failed the step-0 guard.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// ─── Requests ────────────────────────────────────────────────────────

/// Input for `POST /communities/verify-email/send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpIssueRequest {
    /// Created community.
    pub community_id: CommunityId,
    /// Address to verify.
    pub domain_email: Email,
}

/// Input for `POST /communities/verify-email/confirm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpConfirmRequest {
    /// Created community.
    pub community_id: CommunityId,
    /// Six-digit code.
    pub otp: OtpCode,
}

/// Input for `POST /communities/{id}/invite-authorized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRequest {
    /// Created community.
    pub community_id: CommunityId,
    /// Recipient.
    pub email: Email,
}

/// Record of a step change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTransition {
    /// Step before.
    pub from: WizardStep,
    /// Step after.
    pub to: WizardStep,
    /// When the change happened.
    pub at: DateTime<Utc>,
}

/// What `close()` discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    /// The step the wizard was at.
    pub step_at_close: WizardStep,
    /// Set when the flow had finished.
    pub completion: Option<Completion>,
    /// The community created by this run, if any.
    pub community_id: Option<CommunityId>,
}

impl CloseOutcome {
    /// Whether the flow finished before closing.
    pub fn is_success(&self) -> bool {
        self.completion.is_some()
    }

    /// A created community left Pending because the flow did not finish.
    pub fn orphaned(&self) -> Option<&CommunityId> {
        match self.completion {
            Some(_) => None,
            None => self.community_id.as_ref(),
        }
    }
}

// ─── Wizard ──────────────────────────────────────────────────────────

/// The onboarding step machine.
#[derive(Debug, Clone)]
pub struct Wizard {
    draft: WizardDraft,
    step: WizardStep,
    created_community_id: Option<CommunityId>,
    frozen_type: Option<CommunityType>,
    target: Option<VerificationTarget>,
    otp_input: OtpInput,
    issued_otp: Option<OtpCode>,
    invites: InviteLedger,
    processing: bool,
    completion: Option<Completion>,
    transitions: Vec<StepTransition>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// A freshly opened wizard.
    pub fn new() -> Self {
        Self {
            draft: WizardDraft::new(),
            step: WizardStep::BasicInfo,
            created_community_id: None,
            frozen_type: None,
            target: None,
            otp_input: OtpInput::new(),
            issued_otp: None,
            invites: InviteLedger::default(),
            processing: false,
            completion: None,
            transitions: Vec::new(),
        }
    }

    /// Current step.
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// The draft as last edited.
    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    /// Edit the draft. Only possible at step 0 with no request in flight.
    pub fn draft_mut(&mut self) -> Result<&mut WizardDraft, WizardError> {
        self.require_idle()?;
        self.require_step(WizardStep::BasicInfo, "edit draft")?;
        Ok(&mut self.draft)
    }

    /// Change the community type before creation.
    pub fn set_type(&mut self, community_type: CommunityType) -> Result<(), WizardError> {
        if self.created_community_id.is_some() {
            return Err(WizardError::TypeFrozen);
        }
        self.draft_mut()?.community_type = community_type;
        Ok(())
    }

    /// The community type: frozen after creation, draft value before.
    pub fn community_type(&self) -> CommunityType {
        self.frozen_type.unwrap_or(self.draft.community_type)
    }

    /// Id assigned by the backend, once created.
    pub fn created_community_id(&self) -> Option<&CommunityId> {
        self.created_community_id.as_ref()
    }

    /// The OTP field.
    pub fn otp_input(&self) -> &OtpInput {
        &self.otp_input
    }

    /// The code the server echoed on issuance, if any.
    pub fn issued_otp(&self) -> Option<&OtpCode> {
        self.issued_otp.as_ref()
    }

    /// Authorized-invite ledger (empty for Single).
    pub fn invites(&self) -> &InviteLedger {
        &self.invites
    }

    /// Whether a request is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// How the flow finished, if it has.
    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    /// Step history since the wizard was opened.
    pub fn transitions(&self) -> &[StepTransition] {
        &self.transitions
    }

    // ── Step 0 ───────────────────────────────────────────────────────

    /// Validate the draft and build the creation request.
    pub fn begin_creation(&mut self, creator: &UserId) -> Result<NewCommunity, WizardError> {
        self.require_idle()?;
        self.require_step(WizardStep::BasicInfo, "create community")?;
        let validated = self.draft.validate()?;
        self.processing = true;
        Ok(validated.to_request(creator))
    }

    /// Apply a successful creation and branch on type.
    pub fn record_created(&mut self, id: CommunityId) -> Result<WizardStep, WizardError> {
        self.require_step(WizardStep::BasicInfo, "record creation")?;
        let validated = self.draft.validate()?;
        let community_type = validated.community_type();
        let next = match &validated.target {
            VerificationTarget::DomainEmail(_) => WizardStep::EmailVerification,
            VerificationTarget::AuthorizedPersons(list) => {
                self.invites = InviteLedger::new(list.iter().cloned());
                WizardStep::AuthorizedInvites
            }
        };
        self.created_community_id = Some(id);
        self.frozen_type = Some(community_type);
        self.target = Some(validated.target);
        self.processing = false;
        self.do_transition(next);
        Ok(next)
    }

    /// Release the in-flight flag after a failed request. Nothing else
    /// changes, so the operator can retry or cancel.
    pub fn record_failure(&mut self) {
        self.processing = false;
    }

    // ── Step 1 (Single) ──────────────────────────────────────────────

    /// Build an OTP issuance request. Also used for resend.
    pub fn begin_otp_issue(&mut self) -> Result<OtpIssueRequest, WizardError> {
        let community_id = self.require_created()?;
        self.require_step(WizardStep::EmailVerification, "issue OTP")?;
        self.require_idle()?;
        let domain_email = match &self.target {
            Some(VerificationTarget::DomainEmail(email)) => email.clone(),
            _ => {
                return Err(WizardError::WrongStep {
                    step: self.step,
                    operation: "issue OTP",
                })
            }
        };
        self.processing = true;
        Ok(OtpIssueRequest {
            community_id,
            domain_email,
        })
    }

    /// Apply an issuance. A new code invalidates whatever was typed.
    pub fn record_otp_issued(&mut self, echoed: Option<OtpCode>) -> Result<(), WizardError> {
        self.require_step(WizardStep::EmailVerification, "record OTP issuance")?;
        self.issued_otp = echoed;
        self.otp_input.clear();
        self.processing = false;
        Ok(())
    }

    /// Replace the OTP field with the sanitized form of `raw`.
    pub fn enter_otp(&mut self, raw: &str) -> Result<&OtpInput, WizardError> {
        self.require_step(WizardStep::EmailVerification, "enter OTP")?;
        self.require_idle()?;
        self.otp_input.set(raw);
        Ok(&self.otp_input)
    }

    /// Whether the Verify action is enabled.
    pub fn can_verify(&self) -> bool {
        self.step == WizardStep::EmailVerification
            && self.created_community_id.is_some()
            && !self.processing
            && self.otp_input.is_complete()
    }

    /// Build the confirmation request from a complete OTP field.
    pub fn begin_otp_confirm(&mut self) -> Result<OtpConfirmRequest, WizardError> {
        let community_id = self.require_created()?;
        self.require_step(WizardStep::EmailVerification, "confirm OTP")?;
        self.require_idle()?;
        let otp = self.otp_input.to_code().ok_or(WizardError::OtpIncomplete)?;
        self.processing = true;
        Ok(OtpConfirmRequest { community_id, otp })
    }

    /// Apply a successful confirmation: the community is Active.
    pub fn record_confirmed(&mut self) -> Result<(), WizardError> {
        self.require_step(WizardStep::EmailVerification, "record confirmation")?;
        self.processing = false;
        self.completion = Some(Completion::Activated);
        self.do_transition(WizardStep::Closed);
        Ok(())
    }

    // ── Step 2 (Multi) ───────────────────────────────────────────────

    /// Start an invite pass over every email not yet issued, in order.
    pub fn begin_invites(&mut self) -> Result<Vec<InviteRequest>, WizardError> {
        let community_id = self.require_created()?;
        self.require_step(WizardStep::AuthorizedInvites, "send invites")?;
        self.require_idle()?;
        self.processing = true;
        Ok(self
            .invites
            .pending()
            .into_iter()
            .map(|email| InviteRequest {
                community_id: community_id.clone(),
                email,
            })
            .collect())
    }

    /// Record one call of the invite pass.
    pub fn record_invite_outcome(
        &mut self,
        email: &Email,
        outcome: InviteOutcome,
    ) -> Result<(), WizardError> {
        self.require_step(WizardStep::AuthorizedInvites, "record invite")?;
        if !self.invites.record(email, outcome) {
            return Err(WizardError::UnknownInvite(email.to_string()));
        }
        Ok(())
    }

    /// End an invite pass. Closes the flow when every invite is out.
    pub fn finish_invites(&mut self) -> Result<InviteReport, WizardError> {
        self.require_step(WizardStep::AuthorizedInvites, "finish invites")?;
        self.processing = false;
        Ok(self.settle_invites())
    }

    /// Build a resend request for one authorized person.
    pub fn begin_resend(&mut self, email: &Email) -> Result<InviteRequest, WizardError> {
        let community_id = self.require_created()?;
        self.require_step(WizardStep::AuthorizedInvites, "resend invite")?;
        self.require_idle()?;
        if !self.invites.contains(email) {
            return Err(WizardError::UnknownInvite(email.to_string()));
        }
        self.processing = true;
        Ok(InviteRequest {
            community_id,
            email: email.clone(),
        })
    }

    /// Apply the outcome of a resend. Other invites are untouched.
    pub fn record_resend(
        &mut self,
        email: &Email,
        outcome: InviteOutcome,
    ) -> Result<InviteReport, WizardError> {
        self.require_step(WizardStep::AuthorizedInvites, "record resend")?;
        if !self.invites.mark_resent(email, outcome) {
            return Err(WizardError::UnknownInvite(email.to_string()));
        }
        self.processing = false;
        Ok(self.settle_invites())
    }

    // ── Close ────────────────────────────────────────────────────────

    /// Discard all local state. Idempotent; no request is implied.
    pub fn close(&mut self) -> CloseOutcome {
        let outcome = CloseOutcome {
            step_at_close: self.step,
            completion: self.completion,
            community_id: self.created_community_id.clone(),
        };
        *self = Self::new();
        outcome
    }

    // ── Internals ────────────────────────────────────────────────────

    fn settle_invites(&mut self) -> InviteReport {
        let report = self.invites.report();
        if report.is_complete() {
            self.completion = Some(Completion::InvitesSent);
            self.do_transition(WizardStep::Closed);
        }
        report
    }

    fn require_created(&self) -> Result<CommunityId, WizardError> {
        self.created_community_id
            .clone()
            .ok_or(WizardError::NotCreated)
    }

    fn require_idle(&self) -> Result<(), WizardError> {
        if self.processing {
            return Err(WizardError::Busy);
        }
        Ok(())
    }

    fn require_step(&self, expected: WizardStep, operation: &'static str) -> Result<(), WizardError> {
        if self.step != expected {
            return Err(WizardError::WrongStep {
                step: self.step,
                operation,
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: WizardStep) {
        self.transitions.push(StepTransition {
            from: self.step,
            to,
            at: Utc::now(),
        });
        self.step = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn creator() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    fn cid(s: &str) -> CommunityId {
        CommunityId::new(s).unwrap()
    }

    fn email(s: &str) -> Email {
        Email::new(s).unwrap()
    }

    fn single_wizard() -> Wizard {
        let mut w = Wizard::new();
        let d = w.draft_mut().unwrap();
        d.name = "Tech Daily".into();
        d.domain_email = "ed@tech.com".into();
        w
    }

    fn multi_wizard(emails: &[&str]) -> Wizard {
        let mut w = Wizard::new();
        w.set_type(CommunityType::Multi).unwrap();
        let d = w.draft_mut().unwrap();
        d.name = "Makers".into();
        d.authorized_persons = emails.iter().map(|s| s.to_string()).collect();
        w
    }

    fn created_single() -> Wizard {
        let mut w = single_wizard();
        w.begin_creation(&creator()).unwrap();
        w.record_created(cid("c1")).unwrap();
        w
    }

    fn created_multi(emails: &[&str]) -> Wizard {
        let mut w = multi_wizard(emails);
        w.begin_creation(&creator()).unwrap();
        w.record_created(cid("c2")).unwrap();
        w
    }

    // ── Single flow ──────────────────────────────────────────────────

    #[test]
    fn test_single_happy_path() {
        let mut w = single_wizard();
        let req = w.begin_creation(&creator()).unwrap();
        assert_eq!(req.community_type, CommunityType::Single);
        assert!(w.is_processing());

        assert_eq!(w.record_created(cid("c1")).unwrap(), WizardStep::EmailVerification);
        assert_eq!(w.step().code(), Some(1));

        let issue = w.begin_otp_issue().unwrap();
        assert_eq!(issue.domain_email.as_str(), "ed@tech.com");
        w.record_otp_issued(Some(OtpCode::new("482913").unwrap())).unwrap();
        assert_eq!(w.issued_otp().unwrap().as_str(), "482913");

        w.enter_otp("482913").unwrap();
        assert!(w.can_verify());
        let confirm = w.begin_otp_confirm().unwrap();
        assert_eq!(confirm.otp.as_str(), "482913");
        assert_eq!(confirm.community_id, cid("c1"));
        w.record_confirmed().unwrap();

        assert_eq!(w.step(), WizardStep::Closed);
        assert_eq!(w.completion(), Some(Completion::Activated));
        assert_eq!(w.transitions().len(), 2);
    }

    #[test]
    fn test_partial_otp_disables_verify() {
        let mut w = created_single();
        assert_eq!(w.enter_otp("12a45").unwrap().as_str(), "1245");
        assert!(!w.can_verify());
        assert_eq!(w.begin_otp_confirm(), Err(WizardError::OtpIncomplete));
        assert!(!w.is_processing());
    }

    #[test]
    fn test_failed_confirmation_leaves_state() {
        let mut w = created_single();
        w.enter_otp("000000").unwrap();
        w.begin_otp_confirm().unwrap();
        w.record_failure();

        assert_eq!(w.step(), WizardStep::EmailVerification);
        assert_eq!(w.created_community_id(), Some(&cid("c1")));
        assert_eq!(w.otp_input().as_str(), "000000");
        assert!(w.can_verify());
    }

    #[test]
    fn test_reissue_clears_typed_code() {
        let mut w = created_single();
        w.enter_otp("111111").unwrap();
        w.begin_otp_issue().unwrap();
        w.record_otp_issued(None).unwrap();
        assert!(w.otp_input().is_empty());
        assert!(w.issued_otp().is_none());
    }

    #[test]
    fn test_busy_rejects_second_request() {
        let mut w = created_single();
        w.begin_otp_issue().unwrap();
        assert_eq!(w.begin_otp_issue(), Err(WizardError::Busy));
        assert!(matches!(w.enter_otp("1"), Err(WizardError::Busy)));
    }

    // ── Guards ───────────────────────────────────────────────────────

    #[test]
    fn test_verification_without_id_is_not_created() {
        let mut w = single_wizard();
        assert_eq!(w.begin_otp_issue(), Err(WizardError::NotCreated));
        assert_eq!(w.begin_otp_confirm(), Err(WizardError::NotCreated));
        assert_eq!(w.begin_invites(), Err(WizardError::NotCreated));
        assert_eq!(
            w.begin_resend(&email("a@x.com")),
            Err(WizardError::NotCreated)
        );
    }

    #[test]
    fn test_invalid_draft_blocks_creation() {
        let mut w = multi_wizard(&["a@x.com"]);
        let err = w.begin_creation(&creator()).unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::TooFewAuthorizedPersons { .. })
        ));
        assert!(!w.is_processing());
        assert_eq!(w.step(), WizardStep::BasicInfo);
    }

    #[test]
    fn test_type_frozen_after_creation() {
        let mut w = created_single();
        assert_eq!(w.set_type(CommunityType::Multi), Err(WizardError::TypeFrozen));
        assert!(w.draft_mut().is_err());
        assert_eq!(w.community_type(), CommunityType::Single);
    }

    #[test]
    fn test_wrong_step_operations() {
        let mut w = created_multi(&["a@x.com", "b@x.com"]);
        assert!(matches!(
            w.begin_otp_issue(),
            Err(WizardError::WrongStep { .. })
        ));
        assert!(matches!(w.enter_otp("123456"), Err(WizardError::WrongStep { .. })));
        assert!(matches!(
            w.begin_creation(&creator()),
            Err(WizardError::WrongStep { .. })
        ));
    }

    // ── Multi flow ───────────────────────────────────────────────────

    #[test]
    fn test_multi_all_invites_issued() {
        let mut w = created_multi(&["a@x.com", "b@x.com"]);
        assert_eq!(w.step().code(), Some(2));

        let batch = w.begin_invites().unwrap();
        assert_eq!(batch.len(), 2);
        for req in &batch {
            w.record_invite_outcome(&req.email, InviteOutcome::Issued).unwrap();
        }
        let report = w.finish_invites().unwrap();
        assert!(report.is_complete());
        assert_eq!(w.step(), WizardStep::Closed);
        assert_eq!(w.completion(), Some(Completion::InvitesSent));
    }

    #[test]
    fn test_multi_partial_then_retry_failed_only() {
        let mut w = created_multi(&["a@x.com", "b@x.com", "c@x.com"]);
        let batch = w.begin_invites().unwrap();
        w.record_invite_outcome(&batch[0].email, InviteOutcome::Issued)
            .unwrap();
        w.record_invite_outcome(
            &batch[1].email,
            InviteOutcome::Failed {
                reason: "boom".into(),
            },
        )
        .unwrap();
        let report = w.finish_invites().unwrap();
        assert!(report.is_partial());
        assert_eq!(w.step(), WizardStep::AuthorizedInvites);

        let retry = w.begin_invites().unwrap();
        let got: Vec<&str> = retry.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(got, vec!["b@x.com", "c@x.com"]);
    }

    #[test]
    fn test_resend_completes_flow() {
        let mut w = created_multi(&["a@x.com", "b@x.com"]);
        let batch = w.begin_invites().unwrap();
        w.record_invite_outcome(&batch[0].email, InviteOutcome::Issued)
            .unwrap();
        w.record_invite_outcome(
            &batch[1].email,
            InviteOutcome::Failed {
                reason: "x".into(),
            },
        )
        .unwrap();
        w.finish_invites().unwrap();

        let req = w.begin_resend(&email("b@x.com")).unwrap();
        let report = w.record_resend(&req.email, InviteOutcome::Issued).unwrap();
        assert!(report.is_complete());
        assert_eq!(w.invites().records()[0].resends, 0);
        assert_eq!(w.invites().records()[1].resends, 1);
        assert_eq!(w.step(), WizardStep::Closed);
    }

    #[test]
    fn test_resend_unknown_email() {
        let mut w = created_multi(&["a@x.com", "b@x.com"]);
        assert_eq!(
            w.begin_resend(&email("z@x.com")),
            Err(WizardError::UnknownInvite("z@x.com".into()))
        );
    }

    // ── Close ────────────────────────────────────────────────────────

    #[test]
    fn test_close_after_creation_reports_orphan() {
        let mut w = created_single();
        let outcome = w.close();
        assert_eq!(outcome.step_at_close, WizardStep::EmailVerification);
        assert_eq!(outcome.orphaned(), Some(&cid("c1")));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_close_after_success_has_no_orphan() {
        let mut w = created_single();
        w.enter_otp("123456").unwrap();
        w.begin_otp_confirm().unwrap();
        w.record_confirmed().unwrap();
        let outcome = w.close();
        assert!(outcome.is_success());
        assert!(outcome.orphaned().is_none());
        assert_eq!(outcome.community_id, Some(cid("c1")));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut w = created_multi(&["a@x.com", "b@x.com"]);
        w.close();
        let second = w.close();
        assert_eq!(second.step_at_close, WizardStep::BasicInfo);
        assert!(second.orphaned().is_none());
        assert_eq!(w.draft(), &WizardDraft::new());
    }

    fn drive(w: &mut Wizard, steps: u8) {
        if steps >= 1 {
            let _ = w.begin_creation(&creator());
            let _ = w.record_created(cid("c9"));
        }
        if steps >= 2 {
            let _ = w.enter_otp("12");
            let _ = w.begin_otp_issue();
        }
        if steps >= 3 {
            w.record_failure();
            let _ = w.enter_otp("987654");
        }
    }

    proptest! {
        #[test]
        fn close_always_resets(multi in any::<bool>(), steps in 0u8..4) {
            let mut w = if multi {
                multi_wizard(&["a@x.com", "b@x.com"])
            } else {
                single_wizard()
            };
            drive(&mut w, steps);
            w.close();
            prop_assert_eq!(w.step(), WizardStep::BasicInfo);
            prop_assert_eq!(w.draft(), &WizardDraft::new());
            prop_assert!(w.created_community_id().is_none());
            prop_assert!(w.otp_input().is_empty());
            prop_assert!(w.issued_otp().is_none());
            prop_assert!(w.invites().is_empty());
            prop_assert!(!w.is_processing());
            prop_assert!(w.transitions().is_empty());
        }
    }
}
