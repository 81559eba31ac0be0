// SPDX-License-Identifier: BUSL-1.1
#![deny(missing_docs)]

//! # tribune-state -- Onboarding and Access State Machines
//!
//! Pure, synchronous state machines. Nothing here performs I/O; the async
//! orchestration lives in `tribune-client`, which feeds server responses
//! back into these types.
//!
//! ## State Machines
//!
//! - **Wizard** ([`wizard`]): `BasicInfo → EmailVerification | AuthorizedInvites
//!   → Closed`, with runtime-checked guards. The draft it edits lives in
//!   [`draft`].
//!
//! - **Invite ledger** ([`invites`]): per-email outcome log for the
//!   sequential authorized-invite loop, with retry of failed entries only.
//!
//! - **Route guard** ([`guard`]): fail-closed check of the cached session.
//!
//! - **Activation** ([`activation`]): when a Pending community may become
//!   Active.
//!
//! [`post`] holds the session-gated composer for community posts.

pub mod activation;
pub mod draft;
pub mod guard;
pub mod invites;
pub mod post;
pub mod wizard;

pub use activation::{ActivationEvidence, ActivationRule, REQUIRED_APPROVALS};
pub use draft::{NewCommunity, ValidatedDraft, VerificationTarget, WizardDraft};
pub use guard::{AdminSession, GuardDecision, RedirectReason, RouteGuard, SessionInvalid, LOGIN_PATH};
pub use invites::{FailedInvite, InviteLedger, InviteOutcome, InviteRecord, InviteReport};
pub use post::{NewPost, PostError};
pub use wizard::{
    CloseOutcome, Completion, InviteRequest, OtpConfirmRequest, OtpIssueRequest, StepTransition,
    Wizard, WizardError, WizardStep,
};
