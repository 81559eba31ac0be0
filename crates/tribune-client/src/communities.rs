// SPDX-License-Identifier: BUSL-1.1
//! Typed client for the community endpoints.
//!
//! ## Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/communities` | List communities |
//! | GET    | `/communities/{id}` | Get by ID |
//! | POST   | `/communities` | Create (status Pending) |
//! | DELETE | `/communities/{id}` | Delete |
//! | POST   | `/communities/verify-email/send` | Issue domain-email OTP |
//! | POST   | `/communities/verify-email/confirm` | Confirm domain-email OTP |
//! | POST   | `/communities/{id}/invite-authorized` | Issue one authorized invite |
//! | POST   | `/communities/authorized/approve` | Approve one authorized invite |
//! | POST   | `/communities/{id}/join` | Ask to join as the session's user |
//! | POST   | `/communities/request/approve` | Accept a join request |
//! | POST   | `/communities/request/reject` | Decline a join request |

use serde::{Deserialize, Serialize};

use tribune_core::{CommunityId, CommunityStatus, CommunityType, Email, OtpCode, UserId};
use tribune_state::NewCommunity;

use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::Community;

// -- Request / response types -------------------------------------------------

/// Answer to an OTP-bearing issuance (domain email or authorized invite).
///
/// `otp` is the code echoed back by servers that run in relay mode, where
/// the operator passes the code on by hand. Production servers send the
/// code by email and omit it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOtpIssued")]
pub struct OtpIssued {
    /// Echoed code, when present and well-formed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<OtpCode>,
    /// Server message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct RawOtpIssued {
    #[serde(default)]
    otp: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl From<RawOtpIssued> for OtpIssued {
    fn from(raw: RawOtpIssued) -> Self {
        let otp = match raw.otp {
            Some(serde_json::Value::String(s)) => OtpCode::new(s).ok(),
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .filter(|v| *v < 1_000_000)
                .map(|v| OtpCode::from_number(v as u32)),
            _ => None,
        };
        Self {
            otp,
            message: raw.message,
        }
    }
}

/// Generic acknowledgement for state-changing calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    /// Server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Community status after the call, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CommunityStatus>,
    /// Approval count after the call, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approvals: Option<u32>,
}

/// Who is approving an authorized invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approver {
    /// A user found in the directory.
    User(UserId),
    /// Raw email, used when the directory has no match.
    Email(Email),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApproveBody<'a> {
    community_id: &'a CommunityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a Email>,
    otp: &'a OtpCode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpBody<'a> {
    community_id: &'a CommunityId,
    domain_email: &'a Email,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmOtpBody<'a> {
    community_id: &'a CommunityId,
    otp: &'a OtpCode,
}

#[derive(Serialize)]
struct InviteBody<'a> {
    email: &'a Email,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinDecisionBody<'a> {
    community_id: &'a CommunityId,
    user_id: &'a UserId,
}

/// A decision on a pending join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    /// Move the user into the member list.
    Approve,
    /// Drop the request.
    Reject,
}

impl JoinDecision {
    fn segment(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Client-side listing filter, as offered by the console's type and
/// status dropdowns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommunityFilter {
    /// Keep only this type.
    pub community_type: Option<CommunityType>,
    /// Keep only this status.
    pub status: Option<CommunityStatus>,
}

impl CommunityFilter {
    /// Whether `community` passes the filter.
    pub fn matches(&self, community: &Community) -> bool {
        self.community_type
            .map_or(true, |t| community.community_type == t)
            && self.status.map_or(true, |s| community.status == s)
    }

    /// Keep the matching communities, preserving order.
    pub fn apply(&self, communities: Vec<Community>) -> Vec<Community> {
        communities.into_iter().filter(|c| self.matches(c)).collect()
    }
}

/// What `discard_pending` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardOutcome {
    /// The Pending community was deleted.
    Deleted,
    /// The community had already activated and was kept.
    KeptActive,
    /// No such community.
    NotFound,
}

// -- Client -------------------------------------------------------------------

/// Client for the community endpoints.
#[derive(Debug, Clone)]
pub struct CommunityClient {
    transport: Transport,
}

impl CommunityClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List every community.
    ///
    /// Calls `GET {base_url}/communities`.
    pub async fn list(&self) -> Result<Vec<Community>, ApiError> {
        let endpoint = "GET /communities";
        let resp = self
            .transport
            .send(self.transport.get(&["communities"])?, endpoint)
            .await?;
        Transport::decode(resp, endpoint).await
    }

    /// Get a community by ID. Returns `None` on 404.
    ///
    /// Calls `GET {base_url}/communities/{id}`.
    pub async fn get(&self, id: &CommunityId) -> Result<Option<Community>, ApiError> {
        let endpoint = format!("GET /communities/{id}");
        let result = self
            .transport
            .send(self.transport.get(&["communities", id.as_str()])?, &endpoint)
            .await;
        let resp = match result {
            Ok(resp) => resp,
            Err(ApiError::Api { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Transport::decode(resp, &endpoint).await.map(Some)
    }

    /// Create a community in Pending status.
    ///
    /// Calls `POST {base_url}/communities`.
    pub async fn create(&self, req: &NewCommunity) -> Result<Community, ApiError> {
        let endpoint = "POST /communities";
        let resp = self
            .transport
            .send(self.transport.post(&["communities"])?.json(req), endpoint)
            .await?;
        Transport::decode(resp, endpoint).await
    }

    /// Delete a community.
    ///
    /// Calls `DELETE {base_url}/communities/{id}`.
    pub async fn delete(&self, id: &CommunityId) -> Result<(), ApiError> {
        let endpoint = format!("DELETE /communities/{id}");
        self.transport
            .send(self.transport.delete(&["communities", id.as_str()])?, &endpoint)
            .await?;
        Ok(())
    }

    /// Delete a community only while it is still Pending.
    ///
    /// Used to reap communities left behind by a cancelled wizard.
    pub async fn discard_pending(&self, id: &CommunityId) -> Result<DiscardOutcome, ApiError> {
        match self.get(id).await? {
            None => Ok(DiscardOutcome::NotFound),
            Some(c) if c.status == CommunityStatus::Active => {
                tracing::info!(community_id = %id, "community already active; not discarding");
                Ok(DiscardOutcome::KeptActive)
            }
            Some(_) => {
                self.delete(id).await?;
                tracing::info!(community_id = %id, "discarded pending community");
                Ok(DiscardOutcome::Deleted)
            }
        }
    }

    /// Issue a domain-email OTP. Re-issuing invalidates the prior code.
    ///
    /// Calls `POST {base_url}/communities/verify-email/send`.
    pub async fn send_email_otp(
        &self,
        community_id: &CommunityId,
        domain_email: &Email,
    ) -> Result<OtpIssued, ApiError> {
        let endpoint = "POST /communities/verify-email/send";
        let body = SendOtpBody {
            community_id,
            domain_email,
        };
        let resp = self
            .transport
            .send(
                self.transport
                    .post(&["communities", "verify-email", "send"])?
                    .json(&body),
                endpoint,
            )
            .await?;
        Transport::decode(resp, endpoint).await
    }

    /// Confirm a domain-email OTP. Success activates the community.
    ///
    /// Calls `POST {base_url}/communities/verify-email/confirm`.
    pub async fn confirm_email_otp(
        &self,
        community_id: &CommunityId,
        otp: &OtpCode,
    ) -> Result<Acknowledgement, ApiError> {
        let endpoint = "POST /communities/verify-email/confirm";
        let body = ConfirmOtpBody { community_id, otp };
        let resp = self
            .transport
            .send(
                self.transport
                    .post(&["communities", "verify-email", "confirm"])?
                    .json(&body),
                endpoint,
            )
            .await?;
        Transport::decode(resp, endpoint).await
    }

    /// Issue one authorized-person invite.
    ///
    /// Calls `POST {base_url}/communities/{id}/invite-authorized`.
    pub async fn invite_authorized(
        &self,
        community_id: &CommunityId,
        email: &Email,
    ) -> Result<OtpIssued, ApiError> {
        let endpoint = format!("POST /communities/{community_id}/invite-authorized");
        let resp = self
            .transport
            .send(
                self.transport
                    .post(&["communities", community_id.as_str(), "invite-authorized"])?
                    .json(&InviteBody { email }),
                &endpoint,
            )
            .await?;
        Transport::decode(resp, &endpoint).await
    }

    /// Approve one authorized invite. The community activates at the
    /// second approval.
    ///
    /// Calls `POST {base_url}/communities/authorized/approve`.
    pub async fn approve_authorized(
        &self,
        community_id: &CommunityId,
        approver: &Approver,
        otp: &OtpCode,
    ) -> Result<Acknowledgement, ApiError> {
        let endpoint = "POST /communities/authorized/approve";
        let (user_id, email) = match approver {
            Approver::User(id) => (Some(id), None),
            Approver::Email(email) => (None, Some(email)),
        };
        let body = ApproveBody {
            community_id,
            user_id,
            email,
            otp,
        };
        let resp = self
            .transport
            .send(
                self.transport
                    .post(&["communities", "authorized", "approve"])?
                    .json(&body),
                endpoint,
            )
            .await?;
        Transport::decode(resp, endpoint).await
    }

    /// Ask to join `id` as the logged-in user. The request waits for an
    /// admin's decision.
    ///
    /// Calls `POST {base_url}/communities/{id}/join`.
    pub async fn request_join(&self, id: &CommunityId) -> Result<Acknowledgement, ApiError> {
        let endpoint = format!("POST /communities/{id}/join");
        let resp = self
            .transport
            .send(
                self.transport.post(&["communities", id.as_str(), "join"])?,
                &endpoint,
            )
            .await?;
        Transport::decode(resp, &endpoint).await
    }

    /// Accept or decline `user_id`'s request to join `community_id`.
    ///
    /// Calls `POST {base_url}/communities/request/{approve|reject}`.
    pub async fn decide_join_request(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        decision: JoinDecision,
    ) -> Result<Acknowledgement, ApiError> {
        let endpoint = format!("POST /communities/request/{}", decision.segment());
        let body = JoinDecisionBody {
            community_id,
            user_id,
        };
        let resp = self
            .transport
            .send(
                self.transport
                    .post(&["communities", "request", decision.segment()])?
                    .json(&body),
                &endpoint,
            )
            .await?;
        let ack = Transport::decode(resp, &endpoint).await?;
        tracing::info!(community_id = %community_id, user_id = %user_id, ?decision, "join request decided");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn community(ty: &str, status: &str) -> Community {
        serde_json::from_value(serde_json::json!({
            "_id": format!("{ty}-{status}"), "name": "n", "type": ty, "status": status
        }))
        .unwrap()
    }

    #[test]
    fn otp_issued_accepts_string_and_number() {
        let a: OtpIssued = serde_json::from_str(r#"{"otp":"482913","message":"sent"}"#).unwrap();
        assert_eq!(a.otp.unwrap().as_str(), "482913");
        let b: OtpIssued = serde_json::from_str(r#"{"otp":42}"#).unwrap();
        assert_eq!(b.otp.unwrap().as_str(), "000042");
    }

    #[test]
    fn otp_issued_ignores_malformed_code() {
        let a: OtpIssued = serde_json::from_str(r#"{"otp":"12ab","message":"sent"}"#).unwrap();
        assert!(a.otp.is_none());
        assert_eq!(a.message.as_deref(), Some("sent"));
        let b: OtpIssued = serde_json::from_str(r#"{"message":"check your inbox"}"#).unwrap();
        assert!(b.otp.is_none());
    }

    #[test]
    fn approve_body_uses_one_identifier() {
        let cid = CommunityId::new("c1").unwrap();
        let otp = OtpCode::new("111111").unwrap();
        let uid = UserId::new("u1").unwrap();
        let body = ApproveBody {
            community_id: &cid,
            user_id: Some(&uid),
            email: None,
            otp: &otp,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["communityId"], "c1");
        assert_eq!(json["userId"], "u1");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn filter_by_type_and_status() {
        let all = vec![
            community("Single", "Pending"),
            community("Multi", "Pending"),
            community("Multi", "Active"),
        ];
        let f = CommunityFilter {
            community_type: Some(CommunityType::Multi),
            status: None,
        };
        assert_eq!(f.apply(all.clone()).len(), 2);
        let f = CommunityFilter {
            community_type: Some(CommunityType::Multi),
            status: Some(CommunityStatus::Active),
        };
        assert_eq!(f.apply(all.clone()).len(), 1);
        assert_eq!(CommunityFilter::default().apply(all).len(), 3);
    }
}
