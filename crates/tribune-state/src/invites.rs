// SPDX-License-Identifier: BUSL-1.1
//! # Authorized-Invite Saga Ledger
//!
//! Invite issuance for a Multi community is a strictly sequential loop with
//! no rollback. The ledger records one outcome per email so that partial
//! progress is explicit: after a failure, the emails before it are
//! [`InviteOutcome::Issued`], the failed one carries its reason, and every
//! later email is still [`InviteOutcome::NotAttempted`].
//!
//! ```text
//! NotAttempted ──▶ Issued
//!      │             ▲
//!      └──▶ Failed ──┘  (retry or resend)
//! ```

use serde::{Deserialize, Serialize};

use tribune_core::Email;

/// Result of the most recent invite attempt for one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InviteOutcome {
    /// No request has been made for this email yet.
    NotAttempted,
    /// The server accepted the invite.
    Issued,
    /// The request failed.
    Failed {
        /// Server-provided or transport error message.
        reason: String,
    },
}

impl InviteOutcome {
    /// Whether the invite is out with the recipient.
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued)
    }
}

/// One authorized person and the state of their invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    /// Recipient.
    pub email: Email,
    /// Latest outcome.
    pub outcome: InviteOutcome,
    /// How many times the invite was re-issued individually.
    pub resends: u32,
}

/// Ordered per-email outcome log for one community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteLedger {
    records: Vec<InviteRecord>,
}

impl InviteLedger {
    /// A ledger with every email `NotAttempted`, in the given order.
    pub fn new(emails: impl IntoIterator<Item = Email>) -> Self {
        Self {
            records: emails
                .into_iter()
                .map(|email| InviteRecord {
                    email,
                    outcome: InviteOutcome::NotAttempted,
                    resends: 0,
                })
                .collect(),
        }
    }

    /// All records in issuance order.
    pub fn records(&self) -> &[InviteRecord] {
        &self.records
    }

    /// Whether the ledger tracks `email`.
    pub fn contains(&self, email: &Email) -> bool {
        self.records.iter().any(|r| &r.email == email)
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Emails not yet issued, in order.
    pub fn pending(&self) -> Vec<Email> {
        self.records
            .iter()
            .filter(|r| !r.outcome.is_issued())
            .map(|r| r.email.clone())
            .collect()
    }

    /// Record the outcome of a loop attempt. Returns `false` for an email
    /// the ledger does not track.
    pub fn record(&mut self, email: &Email, outcome: InviteOutcome) -> bool {
        match self.records.iter_mut().find(|r| &r.email == email) {
            Some(rec) => {
                rec.outcome = outcome;
                true
            }
            None => false,
        }
    }

    /// Record the outcome of an individual resend. Only the matching record
    /// changes. Returns `false` for an unknown email.
    pub fn mark_resent(&mut self, email: &Email, outcome: InviteOutcome) -> bool {
        match self.records.iter_mut().find(|r| &r.email == email) {
            Some(rec) => {
                rec.outcome = outcome;
                rec.resends += 1;
                true
            }
            None => false,
        }
    }

    /// Summarize the ledger.
    pub fn report(&self) -> InviteReport {
        let mut report = InviteReport::default();
        for rec in &self.records {
            match &rec.outcome {
                InviteOutcome::Issued => report.issued.push(rec.email.clone()),
                InviteOutcome::Failed { reason } => {
                    report.failed.push(FailedInvite {
                        email: rec.email.clone(),
                        reason: reason.clone(),
                    });
                    report.retry_order.push(rec.email.clone());
                }
                InviteOutcome::NotAttempted => {
                    report.not_attempted.push(rec.email.clone());
                    report.retry_order.push(rec.email.clone());
                }
            }
        }
        report
    }
}

/// An invite that failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedInvite {
    /// Recipient.
    pub email: Email,
    /// Failure message.
    pub reason: String,
}

/// Structured partial-success result of an invite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteReport {
    /// Emails whose invite is out.
    pub issued: Vec<Email>,
    /// Emails whose latest attempt failed.
    pub failed: Vec<FailedInvite>,
    /// Emails never attempted because the loop stopped earlier.
    pub not_attempted: Vec<Email>,
    #[serde(skip)]
    retry_order: Vec<Email>,
}

impl InviteReport {
    /// Every invite was issued.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.not_attempted.is_empty()
    }

    /// Some, but not all, invites were issued.
    pub fn is_partial(&self) -> bool {
        !self.issued.is_empty() && !self.is_complete()
    }

    /// Nothing was issued and at least one attempt failed.
    pub fn is_total_failure(&self) -> bool {
        self.issued.is_empty() && !self.failed.is_empty()
    }

    /// Failed and not-attempted emails, in original order.
    pub fn retry_targets(&self) -> &[Email] {
        &self.retry_order
    }

    /// The first failure reason, if any.
    pub fn first_failure(&self) -> Option<&FailedInvite> {
        self.failed.first()
    }
}
