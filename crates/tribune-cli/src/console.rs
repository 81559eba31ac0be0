// SPDX-License-Identifier: BUSL-1.1
//! Shared command context: the API client, the session file and the route
//! guard check that every administrative command runs first.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use tribune_client::{ApiError, TribuneApiConfig, TribuneClient};
use tribune_state::{AdminSession, GuardDecision, RouteGuard, LOGIN_PATH};

use crate::session_file::{default_session_path, FileSessionStore};

/// Exit code for success.
pub const EXIT_OK: u8 = 0;
/// Exit code for a failed command.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code when the route guard sends the operator back to login.
pub const EXIT_LOGIN_REQUIRED: u8 = 2;

/// Everything a command needs.
#[derive(Debug)]
pub struct Console {
    client: TribuneClient,
    session: Arc<FileSessionStore>,
}

impl Console {
    /// Build from the environment, with optional overrides from flags.
    pub fn open(api_url: Option<&str>, session_file: Option<PathBuf>) -> Result<Self> {
        let mut config = TribuneApiConfig::from_env()?;
        if let Some(url) = api_url {
            config = config.with_base_url(url)?;
        }
        let path = match session_file {
            Some(path) => path,
            None => default_session_path()
                .context("cannot determine a config directory; pass --session-file")?,
        };
        tracing::debug!(api = %config.base_url, session = %path.display(), "console configured");
        Self::with_parts(config, FileSessionStore::open(path))
    }

    /// Build from explicit parts.
    pub fn with_parts(config: TribuneApiConfig, session: FileSessionStore) -> Result<Self> {
        let session = Arc::new(session);
        let client = TribuneClient::new(config, session.clone())?;
        Ok(Self { client, session })
    }

    /// The API client.
    pub fn client(&self) -> &TribuneClient {
        &self.client
    }

    /// The session store.
    pub fn session(&self) -> &FileSessionStore {
        &self.session
    }

    /// Make sure the session file matches the in-memory session.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written; a token the console has
    /// dropped may still be on disk.
    pub fn sync_session(&self) -> Result<()> {
        self.session.flush().with_context(|| {
            format!(
                "failed to update session file {}; delete it to log out",
                self.session.path().display()
            )
        })
    }

    /// Run the route guard. `None` means the caller must exit with
    /// [`EXIT_LOGIN_REQUIRED`]; the reason has been printed.
    pub fn require_admin(&self) -> Option<AdminSession> {
        match RouteGuard::check(self.session.as_ref()) {
            GuardDecision::Allow(session) => Some(session),
            GuardDecision::Redirect { reason } => {
                tracing::warn!(%reason, "route guard redirect");
                eprintln!("Access denied: {reason}. Run `tribune login` ({LOGIN_PATH}).");
                None
            }
        }
    }
}

/// Map an API failure to an exit code. A 401 has already cleared the
/// session, so it becomes a login redirect; anything else is a failure.
pub fn api_failure(err: ApiError) -> Result<u8> {
    match err {
        ApiError::Unauthorized { .. } => {
            eprintln!("Session expired. Run `tribune login` ({LOGIN_PATH}).");
            Ok(EXIT_LOGIN_REQUIRED)
        }
        other => Err(anyhow::Error::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribune_core::{SessionStore, KEY_ADMIN_USER, KEY_IS_AUTHENTICATED, KEY_TOKEN};

    fn console(dir: &tempfile::TempDir) -> Console {
        let config = TribuneApiConfig::local(1).unwrap();
        Console::with_parts(config, FileSessionStore::open(dir.path().join("s.json"))).unwrap()
    }

    #[test]
    fn empty_session_is_redirected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(console(&dir).require_admin().is_none());
    }

    #[test]
    fn admin_session_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let c = console(&dir);
        c.session().set(KEY_TOKEN, "t");
        c.session().set(KEY_IS_AUTHENTICATED, "true");
        c.session().set(KEY_ADMIN_USER, r#"{"_id":"a1","role":"Admin"}"#);
        let session = c.require_admin().unwrap();
        assert_eq!(session.creator_id().unwrap().as_str(), "a1");
    }

    #[test]
    fn non_admin_session_is_purged() {
        let dir = tempfile::tempdir().unwrap();
        let c = console(&dir);
        c.session().set(KEY_TOKEN, "t");
        c.session().set(KEY_IS_AUTHENTICATED, "true");
        c.session().set(KEY_ADMIN_USER, r#"{"_id":"r1","role":"Reporter"}"#);
        assert!(c.require_admin().is_none());
        assert!(c.session().get(KEY_TOKEN).is_none());
    }

    #[test]
    fn sync_session_reports_unwritable_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let config = TribuneApiConfig::local(1).unwrap();
        let c = Console::with_parts(config, FileSessionStore::open(blocker.join("s.json"))).unwrap();

        c.sync_session().unwrap();
        c.session().set(KEY_TOKEN, "t");
        let err = c.sync_session().unwrap_err();
        assert!(format!("{err:#}").contains("delete it to log out"));
    }

    #[test]
    fn unauthorized_maps_to_login_exit() {
        let code = api_failure(ApiError::Unauthorized {
            endpoint: "GET /communities".into(),
        })
        .unwrap();
        assert_eq!(code, EXIT_LOGIN_REQUIRED);
        assert!(api_failure(ApiError::Api {
            endpoint: "GET /communities".into(),
            status: 500,
            message: "boom".into(),
        })
        .is_err());
    }
}
