// SPDX-License-Identifier: BUSL-1.1
//! # File-backed Session Store
//!
//! Persists the cached session between `tribune` invocations as a flat JSON
//! object of string values, the same keys the route guard reads. Every
//! write rewrites the whole file. On Unix the file is created `0600`.
//!
//! A missing file is an empty session. An unreadable or corrupt file is
//! also treated as empty, so the route guard redirects to login instead of
//! trusting partial state.
//!
//! [`SessionStore`] writes cannot fail, so a failed write is remembered and
//! surfaced by [`FileSessionStore::flush`], which the CLI calls before it
//! exits. Otherwise a purged token could survive on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use zeroize::Zeroizing;

use tribune_core::{SessionStore, TribuneError};

/// Default session file: `<platform config dir>/tribune/session.json`.
pub fn default_session_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tribune")
        .map(|dirs| dirs.config_dir().join("session.json"))
}

/// [`SessionStore`] persisted to a JSON file.
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Zeroizing<String>>>,
    unsynced: AtomicBool,
}

impl std::fmt::Debug for FileSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSessionStore")
            .field("path", &self.path)
            .field("keys", &self.values.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FileSessionStore {
    /// Open the store at `path`, loading whatever it holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match load(&path) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
            unsynced: AtomicBool::new(false),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file lags behind the in-memory session.
    pub fn is_unsynced(&self) -> bool {
        self.unsynced.load(Ordering::SeqCst)
    }

    /// Rewrite the file if an earlier write failed.
    ///
    /// # Errors
    ///
    /// Returns the write error when the file still cannot be updated. The
    /// file may then hold a token that the in-memory session has dropped.
    pub fn flush(&self) -> Result<(), TribuneError> {
        if !self.is_unsynced() {
            return Ok(());
        }
        let values = self.values.lock();
        write(&self.path, &values)?;
        self.unsynced.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, Zeroizing<String>>) {
        match write(&self.path, values) {
            Ok(()) => self.unsynced.store(false, Ordering::SeqCst),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to write session file");
                self.unsynced.store(true, Ordering::SeqCst);
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).map(|v| v.as_str().to_string())
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock();
        values.insert(key.to_string(), Zeroizing::new(value.to_string()));
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.lock();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}

fn load(path: &Path) -> Result<BTreeMap<String, Zeroizing<String>>, TribuneError> {
    let raw = match std::fs::read(path) {
        Ok(raw) => Zeroizing::new(raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    let parsed: BTreeMap<String, String> = serde_json::from_slice(&raw)?;
    Ok(parsed
        .into_iter()
        .map(|(k, v)| (k, Zeroizing::new(v)))
        .collect())
}

fn write(path: &Path, values: &BTreeMap<String, Zeroizing<String>>) -> Result<(), TribuneError> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let plain: BTreeMap<&str, &str> = values.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let bytes = Zeroizing::new(serde_json::to_vec_pretty(&plain)?);

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(&bytes)?;
    Ok(())
}
