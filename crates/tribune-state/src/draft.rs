// SPDX-License-Identifier: BUSL-1.1
//! # Wizard Draft
//!
//! The editable, client-held form state for a community that has not been
//! created yet. [`WizardDraft::validate`] is the step-0 guard: it runs
//! before any network call and yields a [`ValidatedDraft`] whose
//! verification target is fixed by the community type.
//!
//! Blank authorized-person slots are ignored. They exist so the operator
//! can add rows before filling them in, and are never sent.

use serde::{Deserialize, Serialize};

use tribune_core::{CommunityType, Email, UserId, ValidationError};

use crate::activation::REQUIRED_APPROVALS;

/// Mutable form state for a community under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardDraft {
    /// Community name. Required.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Single or Multi.
    pub community_type: CommunityType,
    /// Image reference (URL or upload handle).
    pub image: String,
    /// Address verified by OTP for Single communities.
    pub domain_email: String,
    /// Authorized-person rows for Multi communities, blanks included.
    pub authorized_persons: Vec<String>,
}

impl Default for WizardDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            community_type: CommunityType::Single,
            image: String::new(),
            domain_email: String::new(),
            authorized_persons: vec![String::new(); REQUIRED_APPROVALS],
        }
    }
}

impl WizardDraft {
    /// The initial draft: empty fields, type Single, two blank rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a blank authorized-person row.
    pub fn add_authorized_slot(&mut self) {
        self.authorized_persons.push(String::new());
    }

    /// Remove an authorized-person row. Out-of-range indices are ignored.
    pub fn remove_authorized_slot(&mut self, index: usize) {
        if index < self.authorized_persons.len() {
            self.authorized_persons.remove(index);
        }
    }

    /// Authorized-person rows that are not blank, trimmed.
    pub fn filled_authorized_persons(&self) -> Vec<&str> {
        self.authorized_persons
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Apply the step-0 guard.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyName`] for a blank name.
    /// - [`ValidationError::MissingDomainEmail`] for a Single draft with no
    ///   domain email, [`ValidationError::InvalidEmail`] if it is malformed.
    /// - [`ValidationError::TooFewAuthorizedPersons`] for a Multi draft with
    ///   fewer than two filled rows, then [`ValidationError::InvalidEmail`]
    ///   or [`ValidationError::DuplicateAuthorizedPerson`].
    pub fn validate(&self) -> Result<ValidatedDraft, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let target = match self.community_type {
            CommunityType::Single => {
                let raw = self.domain_email.trim();
                if raw.is_empty() {
                    return Err(ValidationError::MissingDomainEmail);
                }
                VerificationTarget::DomainEmail(Email::new(raw)?)
            }
            CommunityType::Multi => {
                let filled = self.filled_authorized_persons();
                if filled.len() < REQUIRED_APPROVALS {
                    return Err(ValidationError::TooFewAuthorizedPersons {
                        required: REQUIRED_APPROVALS,
                        provided: filled.len(),
                    });
                }
                let mut emails: Vec<Email> = Vec::with_capacity(filled.len());
                for raw in filled {
                    let email = Email::new(raw)?;
                    if emails.contains(&email) {
                        return Err(ValidationError::DuplicateAuthorizedPerson(
                            email.to_string(),
                        ));
                    }
                    emails.push(email);
                }
                VerificationTarget::AuthorizedPersons(emails)
            }
        };

        Ok(ValidatedDraft {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            target,
        })
    }
}

/// What must be verified before a community can activate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationTarget {
    /// Single: one domain address confirmed by OTP.
    DomainEmail(Email),
    /// Multi: the ordered authorized-person list.
    AuthorizedPersons(Vec<Email>),
}

/// A draft that passed the step-0 guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Trimmed description.
    pub description: String,
    /// Trimmed image reference.
    pub image: String,
    /// Type-dependent verification target.
    pub target: VerificationTarget,
}

impl ValidatedDraft {
    /// The community type implied by the verification target.
    pub fn community_type(&self) -> CommunityType {
        match self.target {
            VerificationTarget::DomainEmail(_) => CommunityType::Single,
            VerificationTarget::AuthorizedPersons(_) => CommunityType::Multi,
        }
    }

    /// Build the creation request body for `creator`.
    pub fn to_request(&self, creator: &UserId) -> NewCommunity {
        let (domain_email, authorized_persons) = match &self.target {
            VerificationTarget::DomainEmail(email) => (Some(email.clone()), None),
            VerificationTarget::AuthorizedPersons(list) => (None, Some(list.clone())),
        };
        NewCommunity {
            name: self.name.clone(),
            description: self.description.clone(),
            community_type: self.community_type(),
            image: self.image.clone(),
            creator_id: creator.clone(),
            domain_email,
            authorized_persons,
        }
    }
}

/// `POST /communities` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommunity {
    /// Community name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Community type.
    #[serde(rename = "type")]
    pub community_type: CommunityType,
    /// Image reference.
    pub image: String,
    /// Id of the admin creating the community.
    pub creator_id: UserId,
    /// Present for Single communities only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_email: Option<Email>,
    /// Present for Multi communities only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_persons: Option<Vec<Email>>,
}
