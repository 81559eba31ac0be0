// SPDX-License-Identifier: BUSL-1.1
#![deny(missing_docs)]

//! # tribune-core -- Foundational Types for the Tribune Admin Stack
//!
//! Every other crate in the workspace depends on this one. It has no
//! internal crate dependencies; only `serde`, `serde_json`, `thiserror`
//! and `parking_lot` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`CommunityId`] cannot be
//!    passed where a [`UserId`] is expected, and an [`Email`] is always
//!    normalized and syntactically valid.
//!
//! 2. **Validation at construction.** [`OtpCode`] is exactly six digits by
//!    construction; [`OtpInput`] is the only way free-form text becomes one.
//!    Deserialization routes through the same constructors.
//!
//! 3. **One cached-session abstraction.** [`SessionStore`] is the single
//!    seam for the locally cached credential, role and user record. Route
//!    gating and bearer attachment both read through it.

pub mod community;
pub mod error;
pub mod identity;
pub mod otp;
pub mod session;

pub use community::{CommunityStatus, CommunityType, PostType};
pub use error::{TribuneError, ValidationError};
pub use identity::{pick_identifier, CommunityId, Email, PostId, UserId};
pub use otp::{OtpCode, OtpInput, OTP_LENGTH};
pub use session::{
    clear_auth, store_login, CachedUser, MemorySessionStore, Role, SessionStore, KEY_ADMIN_USER,
    KEY_IS_AUTHENTICATED, KEY_TOKEN,
};
