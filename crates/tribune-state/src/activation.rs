// SPDX-License-Identifier: BUSL-1.1
//! # Activation Rules
//!
//! When a Pending community may become Active. The backend is authoritative;
//! the stub and the tests evaluate the same rule through this module.

use serde::{Deserialize, Serialize};

use tribune_core::CommunityType;

/// Approved authorized invites needed to activate a Multi community.
pub const REQUIRED_APPROVALS: usize = 2;

/// Verification evidence accumulated for one community.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEvidence {
    /// Successful domain-email OTP confirmations.
    pub otp_confirmations: u32,
    /// Approved authorized invites.
    pub approvals: u32,
}

/// The activation precondition for a community type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationRule {
    /// Exactly one confirmed OTP against the domain email.
    DomainEmailConfirmed,
    /// At least `required` approved invites.
    Approvals {
        /// Minimum approvals.
        required: usize,
    },
}

impl ActivationRule {
    /// The rule that applies to `community_type`.
    pub fn for_type(community_type: CommunityType) -> Self {
        match community_type {
            CommunityType::Single => Self::DomainEmailConfirmed,
            CommunityType::Multi => Self::Approvals {
                required: REQUIRED_APPROVALS,
            },
        }
    }

    /// Whether `evidence` satisfies the rule.
    pub fn is_satisfied(&self, evidence: &ActivationEvidence) -> bool {
        match self {
            Self::DomainEmailConfirmed => evidence.otp_confirmations == 1,
            Self::Approvals { required } => evidence.approvals as usize >= *required,
        }
    }
}
