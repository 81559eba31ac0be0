// SPDX-License-Identifier: BUSL-1.1
//! # Route Guard
//!
//! Gates every administrative command behind the cached session. The guard
//! fails closed: a flag without a parsable user record, or a user record
//! with a non-privileged role, purges the cache before redirecting.
//!
//! This is a client-side convenience. The backend authorizes every request
//! on its own.

use thiserror::Error;

use tribune_core::{clear_auth, CachedUser, SessionStore, UserId, KEY_ADMIN_USER, KEY_IS_AUTHENTICATED};

/// Where a rejected session is sent.
pub const LOGIN_PATH: &str = "/login";

/// Why the guard redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectReason {
    /// The authentication flag is absent or not `"true"`.
    NotAuthenticated,
    /// The cached user record is missing or unparsable.
    MalformedUser,
    /// The cached role is not the privileged role.
    NotPrivileged,
}

impl RedirectReason {
    /// Whether the guard purged cached state for this reason.
    pub fn clears_session(&self) -> bool {
        !matches!(self, Self::NotAuthenticated)
    }
}

impl std::fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotAuthenticated => "not authenticated",
            Self::MalformedUser => "cached user record is missing or malformed",
            Self::NotPrivileged => "role is not permitted",
        };
        f.write_str(s)
    }
}

/// The guard's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the protected content with this session.
    Allow(AdminSession),
    /// Send the operator to [`LOGIN_PATH`].
    Redirect {
        /// Why.
        reason: RedirectReason,
    },
}

impl GuardDecision {
    /// The session, when allowed.
    pub fn session(self) -> Option<AdminSession> {
        match self {
            Self::Allow(session) => Some(session),
            Self::Redirect { .. } => None,
        }
    }

    /// Redirect target, when redirected.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Self::Allow(_) => None,
            Self::Redirect { .. } => Some(LOGIN_PATH),
        }
    }
}

/// No creator identity could be resolved from the cached session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no creator session found")]
pub struct SessionInvalid;

/// A session that passed the guard.
///
/// Built once per command and passed to whatever needs the caller's
/// identity, instead of re-reading storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    user: CachedUser,
}

impl AdminSession {
    /// Wrap an already-checked user record.
    pub fn new(user: CachedUser) -> Self {
        Self { user }
    }

    /// The cached user.
    pub fn user(&self) -> &CachedUser {
        &self.user
    }

    /// Identity to send as `creatorId`.
    pub fn creator_id(&self) -> Result<&UserId, SessionInvalid> {
        self.user.id.as_ref().ok_or(SessionInvalid)
    }

    /// Human-readable label for prompts and logs.
    pub fn display_name(&self) -> &str {
        self.user
            .full_name
            .as_deref()
            .or(self.user.email.as_deref())
            .unwrap_or("admin")
    }
}

/// The guard itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    /// Evaluate the cached session, purging it when it is inconsistent.
    pub fn check(store: &dyn SessionStore) -> GuardDecision {
        if store.get(KEY_IS_AUTHENTICATED).as_deref() != Some("true") {
            return GuardDecision::Redirect {
                reason: RedirectReason::NotAuthenticated,
            };
        }

        let user = match store.get(KEY_ADMIN_USER).map(|raw| CachedUser::parse(&raw)) {
            Some(Ok(user)) => user,
            Some(Err(_)) | None => {
                clear_auth(store);
                return GuardDecision::Redirect {
                    reason: RedirectReason::MalformedUser,
                };
            }
        };

        if !user.role.is_privileged() {
            clear_auth(store);
            return GuardDecision::Redirect {
                reason: RedirectReason::NotPrivileged,
            };
        }

        GuardDecision::Allow(AdminSession::new(user))
    }
}
