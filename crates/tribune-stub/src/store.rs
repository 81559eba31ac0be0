// SPDX-License-Identifier: BUSL-1.1
//! In-memory storage backend using DashMap.
//!
//! Users, bearer tokens, communities, posts and the two kinds of
//! verification ticket each get their own map. Tickets hold at most one
//! live code per target: issuing again overwrites, which invalidates the
//! previous code.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use uuid::Uuid;
use zeroize::Zeroizing;

use tribune_core::{
    CommunityId, CommunityStatus, CommunityType, Email, OtpCode, PostId, PostType, Role, UserId,
    ValidationError,
};
use tribune_state::{ActivationEvidence, ActivationRule};

use crate::config::StubConfig;

// ── Records ─────────────────────────────────────────────────────────

/// A directory user. The password never leaves the store.
#[derive(Clone)]
pub struct UserRecord {
    /// Identifier.
    pub id: UserId,
    /// Login email.
    pub email: Email,
    /// Display name.
    pub full_name: String,
    /// Role.
    pub role: Role,
    password: Zeroizing<String>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl UserRecord {
    /// Wire form, as returned by `GET /users` and login.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "_id": self.id,
            "email": self.email,
            "fullName": self.full_name,
            "role": self.role,
        })
    }
}

/// A stored community.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRecord {
    /// Identifier.
    #[serde(rename = "_id")]
    pub id: CommunityId,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Type.
    #[serde(rename = "type")]
    pub community_type: CommunityType,
    /// Lifecycle status.
    pub status: CommunityStatus,
    /// Image reference.
    pub image: String,
    /// Domain email (Single only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_email: Option<Email>,
    /// Authorized persons (Multi only).
    pub authorized_persons: Vec<Email>,
    /// Creating admin.
    pub creator: UserId,
    /// Approvals recorded so far.
    pub approvals: u32,
    /// Domain-email confirmations recorded so far. Not on the wire.
    #[serde(skip)]
    pub otp_confirmations: u32,
    /// Accepted members, in join order.
    pub members: Vec<UserId>,
    /// Users waiting for a decision, in request order.
    pub join_requests: Vec<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl CommunityRecord {
    /// Evidence accumulated towards activation.
    pub fn evidence(&self) -> ActivationEvidence {
        ActivationEvidence {
            otp_confirmations: self.otp_confirmations,
            approvals: self.approvals,
        }
    }
}

/// Result of asking to join a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRequest {
    /// Queued for a decision.
    Filed,
    /// The user is already a member.
    AlreadyMember,
    /// The user already has a pending request.
    AlreadyRequested,
}

/// A post inside a community.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Identifier.
    #[serde(rename = "_id")]
    pub id: PostId,
    /// Owning community.
    pub community_id: CommunityId,
    /// Body text.
    pub content: String,
    /// Audience.
    #[serde(rename = "type")]
    pub post_type: PostType,
    /// Name shown on the post.
    pub author_name: String,
    /// Posting user.
    pub user_id: UserId,
    /// Like count.
    pub likes: u32,
    /// Share count.
    pub shares: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Counter bumped by `PATCH /communities/posts/:post_id/{like,share}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// `likes`.
    Like,
    /// `shares`.
    Share,
}

/// A live one-time code.
#[derive(Debug, Clone)]
pub struct OtpTicket {
    code: OtpCode,
    expires_at: DateTime<Utc>,
}

impl OtpTicket {
    /// Whether `candidate` is this ticket's code and the ticket is unexpired.
    pub fn accepts(&self, candidate: &OtpCode, now: DateTime<Utc>) -> bool {
        now < self.expires_at && &self.code == candidate
    }

    /// Expiry time.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// An authorized-person invite.
#[derive(Debug, Clone)]
pub struct InviteTicket {
    /// The live code.
    pub ticket: OtpTicket,
    /// Set once the invite has been approved. An approved invite is final.
    pub approved: bool,
}

// ── AppState ────────────────────────────────────────────────────────

struct Inner {
    users: DashMap<UserId, UserRecord>,
    tokens: DashMap<String, UserId>,
    communities: DashMap<CommunityId, CommunityRecord>,
    posts: DashMap<PostId, PostRecord>,
    email_tickets: DashMap<CommunityId, OtpTicket>,
    invites: DashMap<(CommunityId, Email), InviteTicket>,
    otp_ttl: Duration,
}

/// Shared application state holding all in-memory stores.
///
/// Cheaply cloneable via `Arc`; all clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    /// Build the state and seed the admin user from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEmail`] if the admin email is not
    /// a valid address.
    pub fn new(config: &StubConfig) -> Result<Self, ValidationError> {
        let admin_email = Email::new(config.admin_email.as_str())?;
        let state = Self {
            inner: Arc::new(Inner {
                users: DashMap::new(),
                tokens: DashMap::new(),
                communities: DashMap::new(),
                posts: DashMap::new(),
                email_tickets: DashMap::new(),
                invites: DashMap::new(),
                otp_ttl: config.otp_ttl(),
            }),
        };
        state.add_user(admin_email, "Administrator", Role::Admin, &config.admin_password)?;
        Ok(state)
    }

    // ── Users and tokens ──

    /// Add a directory user and return its id.
    pub fn add_user(
        &self,
        email: Email,
        full_name: &str,
        role: Role,
        password: &str,
    ) -> Result<UserId, ValidationError> {
        let id = UserId::new(Uuid::new_v4().simple().to_string())?;
        self.inner.users.insert(
            id.clone(),
            UserRecord {
                id: id.clone(),
                email,
                full_name: full_name.to_string(),
                role,
                password: Zeroizing::new(password.to_string()),
            },
        );
        Ok(id)
    }

    /// Check credentials. Returns the user on a match.
    pub fn authenticate(&self, email: &Email, password: &str) -> Option<UserRecord> {
        self.inner
            .users
            .iter()
            .find(|u| &u.email == email && u.password.as_str() == password)
            .map(|u| u.value().clone())
    }

    /// Mint an opaque bearer token for `user`.
    pub fn issue_token(&self, user: &UserId) -> String {
        let token = Uuid::new_v4().to_string();
        self.inner.tokens.insert(token.clone(), user.clone());
        token
    }

    /// The user a bearer token belongs to.
    pub fn token_owner(&self, token: &str) -> Option<UserId> {
        self.inner.tokens.get(token).map(|e| e.value().clone())
    }

    /// Forget a bearer token.
    pub fn revoke_token(&self, token: &str) {
        self.inner.tokens.remove(token);
    }

    /// All users, ordered by email.
    pub fn users(&self) -> Vec<UserRecord> {
        let mut all: Vec<UserRecord> = self.inner.users.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        all
    }

    /// Look up a user by id.
    pub fn user(&self, id: &UserId) -> Option<UserRecord> {
        self.inner.users.get(id).map(|e| e.value().clone())
    }

    // ── Communities ──

    /// Store a new community and return it.
    pub fn insert_community(&self, record: CommunityRecord) -> CommunityRecord {
        self.inner
            .communities
            .insert(record.id.clone(), record.clone());
        record
    }

    /// All communities, oldest first.
    pub fn communities(&self) -> Vec<CommunityRecord> {
        let mut all: Vec<CommunityRecord> = self
            .inner
            .communities
            .iter()
            .map(|e| e.value().clone())
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Look up a community.
    pub fn community(&self, id: &CommunityId) -> Option<CommunityRecord> {
        self.inner.communities.get(id).map(|e| e.value().clone())
    }

    /// Apply `f` to a stored community. Returns `None` if it does not exist.
    pub fn update_community<T>(
        &self,
        id: &CommunityId,
        f: impl FnOnce(&mut CommunityRecord) -> T,
    ) -> Option<T> {
        self.inner
            .communities
            .get_mut(id)
            .map(|mut entry| f(entry.value_mut()))
    }

    /// Update a community's activation evidence with `record`, then
    /// activate it once the rule for its type is satisfied. Returns the
    /// updated record, or `None` if it does not exist.
    pub fn record_evidence(
        &self,
        id: &CommunityId,
        record: impl FnOnce(&mut CommunityRecord),
    ) -> Option<CommunityRecord> {
        self.update_community(id, |c| {
            record(c);
            if ActivationRule::for_type(c.community_type).is_satisfied(&c.evidence()) {
                c.status = CommunityStatus::Active;
            }
            c.clone()
        })
    }

    /// Delete a community together with its tickets and posts.
    pub fn remove_community(&self, id: &CommunityId) -> Option<CommunityRecord> {
        let removed = self.inner.communities.remove(id).map(|(_, v)| v)?;
        self.inner.email_tickets.remove(id);
        self.inner.invites.retain(|(cid, _), _| cid != id);
        self.inner.posts.retain(|_, p| &p.community_id != id);
        Some(removed)
    }

    // ── Membership ──

    /// Queue `user`'s request to join. Returns `None` if the community
    /// does not exist.
    pub fn request_join(&self, id: &CommunityId, user: &UserId) -> Option<JoinRequest> {
        self.update_community(id, |c| {
            if c.members.contains(user) {
                JoinRequest::AlreadyMember
            } else if c.join_requests.contains(user) {
                JoinRequest::AlreadyRequested
            } else {
                c.join_requests.push(user.clone());
                JoinRequest::Filed
            }
        })
    }

    /// Resolve `user`'s pending request, adding them to the members when
    /// `accept` is set. Returns `None` if the community does not exist and
    /// `Some(false)` if there was no pending request.
    pub fn decide_join(&self, id: &CommunityId, user: &UserId, accept: bool) -> Option<bool> {
        self.update_community(id, |c| {
            let Some(pos) = c.join_requests.iter().position(|u| u == user) else {
                return false;
            };
            c.join_requests.remove(pos);
            if accept && !c.members.contains(user) {
                c.members.push(user.clone());
            }
            true
        })
    }

    // ── Posts ──

    /// Store a new post and return it.
    pub fn insert_post(&self, record: PostRecord) -> PostRecord {
        self.inner.posts.insert(record.id.clone(), record.clone());
        record
    }

    /// Posts of one community, newest first.
    pub fn posts_of(&self, community: &CommunityId) -> Vec<PostRecord> {
        let mut found: Vec<PostRecord> = self
            .inner
            .posts
            .iter()
            .filter(|e| &e.community_id == community)
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        found
    }

    /// Bump one counter on a post. Returns `None` if it does not exist.
    pub fn react(&self, id: &PostId, reaction: Reaction) -> Option<PostRecord> {
        self.inner.posts.get_mut(id).map(|mut entry| {
            let post = entry.value_mut();
            match reaction {
                Reaction::Like => post.likes = post.likes.saturating_add(1),
                Reaction::Share => post.shares = post.shares.saturating_add(1),
            }
            post.clone()
        })
    }

    // ── Verification tickets ──

    /// Issue a fresh domain-email code, replacing any live one.
    pub fn issue_email_ticket(&self, community: &CommunityId) -> OtpCode {
        let ticket = self.new_ticket();
        let code = ticket.code.clone();
        self.inner.email_tickets.insert(community.clone(), ticket);
        code
    }

    /// Consume the domain-email ticket if `candidate` matches it.
    ///
    /// A matching code is removed. An expired ticket is removed whatever
    /// the candidate.
    pub fn redeem_email_ticket(&self, community: &CommunityId, candidate: &OtpCode) -> bool {
        let now = Utc::now();
        let removed = self
            .inner
            .email_tickets
            .remove_if(community, |_, t| t.accepts(candidate, now) || now >= t.expires_at);
        matches!(removed, Some((_, t)) if t.accepts(candidate, now))
    }

    /// Issue (or reissue) an invite code for `email`.
    ///
    /// Returns `None` when the invite is already approved; approved
    /// invites are never reissued.
    pub fn issue_invite(&self, community: &CommunityId, email: &Email) -> Option<OtpCode> {
        let key = (community.clone(), email.clone());
        let ticket = self.new_ticket();
        let code = ticket.code.clone();
        let mut entry = self.inner.invites.entry(key).or_insert_with(|| InviteTicket {
            ticket: ticket.clone(),
            approved: false,
        });
        if entry.approved {
            return None;
        }
        entry.ticket = ticket;
        Some(code)
    }

    /// Look up an invite.
    pub fn invite(&self, community: &CommunityId, email: &Email) -> Option<InviteTicket> {
        self.inner
            .invites
            .get(&(community.clone(), email.clone()))
            .map(|e| e.value().clone())
    }

    /// Mark an invite approved if `candidate` is its live code.
    pub fn approve_invite(&self, community: &CommunityId, email: &Email, candidate: &OtpCode) -> bool {
        let now = Utc::now();
        match self
            .inner
            .invites
            .get_mut(&(community.clone(), email.clone()))
        {
            Some(mut entry) if !entry.approved && entry.ticket.accepts(candidate, now) => {
                entry.approved = true;
                true
            }
            _ => false,
        }
    }

    fn new_ticket(&self) -> OtpTicket {
        let now = Utc::now();
        OtpTicket {
            code: random_code(),
            expires_at: now
                .checked_add_signed(self.inner.otp_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

/// A fresh community id.
pub fn new_community_id() -> Result<CommunityId, ValidationError> {
    CommunityId::new(Uuid::new_v4().simple().to_string())
}

/// A fresh post id.
pub fn new_post_id() -> Result<PostId, ValidationError> {
    PostId::new(Uuid::new_v4().simple().to_string())
}

/// Six uniformly distributed digits from the OS RNG.
fn random_code() -> OtpCode {
    // Largest multiple of 1_000_000 below 2^32; rejecting above it keeps
    // every code equally likely.
    const LIMIT: u32 = 4_294_000_000;
    loop {
        let n = OsRng.next_u32();
        if n < LIMIT {
            return OtpCode::from_number(n % 1_000_000);
        }
    }
}
