// SPDX-License-Identifier: BUSL-1.1
//! # Cached Session State
//!
//! The admin console caches three values between runs: the bearer token,
//! an authentication flag, and the JSON-encoded user record. They live
//! behind the [`SessionStore`] trait so that the route guard, the HTTP
//! client and the CLI all read and purge the same state.
//!
//! | Key | Value |
//! |-----|-------|
//! | [`KEY_TOKEN`] | bearer token |
//! | [`KEY_IS_AUTHENTICATED`] | `"true"` when logged in |
//! | [`KEY_ADMIN_USER`] | JSON [`CachedUser`] |

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::TribuneError;
use crate::identity::{pick_identifier, UserId};

/// Storage key for the bearer token.
pub const KEY_TOKEN: &str = "token";
/// Storage key for the authentication flag.
pub const KEY_IS_AUTHENTICATED: &str = "isAdminAuthenticated";
/// Storage key for the cached user record.
pub const KEY_ADMIN_USER: &str = "adminUser";

/// User roles as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// The privileged role: the only one allowed into the console.
    Admin,
    /// News reporter.
    Reporter,
    /// Regular platform user.
    User,
    /// Any role string this build does not know, or a missing role.
    #[default]
    #[serde(other)]
    Other,
}

impl Role {
    /// Whether this role may use the administrative console.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// The cached `adminUser` record.
///
/// The backend is inconsistent about `_id` versus `id`; both are accepted
/// on input and folded into [`CachedUser::id`]. Output always uses `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCachedUser")]
pub struct CachedUser {
    /// Resolved user identifier, if the record carried one.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Role of the cached user.
    pub role: Role,
    /// Display name.
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Email address as reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct RawCachedUser {
    #[serde(rename = "_id", default)]
    underscore_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(rename = "fullName", default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<RawCachedUser> for CachedUser {
    fn from(raw: RawCachedUser) -> Self {
        Self {
            id: pick_identifier(raw.underscore_id, raw.id).and_then(|s| UserId::new(s).ok()),
            role: raw.role,
            full_name: raw.full_name.or(raw.name),
            email: raw.email,
        }
    }
}

impl CachedUser {
    /// Parse the JSON stored under [`KEY_ADMIN_USER`].
    ///
    /// # Errors
    ///
    /// Returns [`TribuneError::Json`] when the value is not JSON or has
    /// mistyped fields, and [`TribuneError::MalformedRecord`] when it is
    /// JSON but not an object. Serde's derived struct visitor also accepts
    /// sequences, so the object check comes first.
    pub fn parse(raw: &str) -> Result<Self, TribuneError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(TribuneError::MalformedRecord("user"));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns [`TribuneError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TribuneError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Synchronous string key/value storage for cached session state.
///
/// Implementations must be `Send + Sync` so one store can be shared
/// between the HTTP client and the route guard behind an `Arc`.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value.
    fn set(&self, key: &str, value: &str);
    /// Delete a value. Deleting a missing key is a no-op.
    fn remove(&self, key: &str);
}

/// Remove every cached authentication value.
pub fn clear_auth(store: &dyn SessionStore) {
    store.remove(KEY_TOKEN);
    store.remove(KEY_IS_AUTHENTICATED);
    store.remove(KEY_ADMIN_USER);
}

/// Cache a successful login.
///
/// # Errors
///
/// Returns [`TribuneError::Json`] if the user record cannot be serialized;
/// nothing is written in that case.
pub fn store_login(
    store: &dyn SessionStore,
    token: &str,
    user: &CachedUser,
) -> Result<(), TribuneError> {
    let user_json = user.to_json()?;
    store.set(KEY_TOKEN, token);
    store.set(KEY_ADMIN_USER, &user_json);
    store.set(KEY_IS_AUTHENTICATED, "true");
    Ok(())
}

/// Process-local [`SessionStore`].
#[derive(Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.values.lock().keys().cloned().collect();
        f.debug_struct("MemorySessionStore")
            .field("keys", &keys)
            .finish()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().remove(key);
    }
}
