// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: current token pair and authenticated identity.
//!
//! The pair and identity share one lifecycle. Every mutation replaces the
//! whole session under a single write lock, so readers never observe a new
//! access token next to a stale refresh token. Absence is a normal state.
//!
//! Storage I/O happens after the write lock is released. Writers serialize
//! on a separate lock and always save the latest in-memory session.

use crate::error::{ClientError, Result};
use crate::models::{CredentialPair, Identity, StoredSession};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the session file inside a profile directory.
const SESSION_FILE: &str = "session.json";

/// Backing storage for the persisted session.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> Result<()>;
    /// Remove the saved session. Removing an absent session succeeds.
    fn clear(&self) -> Result<()>;
}

/// Process-lifetime storage.
#[derive(Default)]
pub struct MemoryStorage {
    session: Mutex<Option<StoredSession>>,
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.session.lock().clone())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.session.lock().take();
        Ok(())
    }
}

/// One `session.json` per profile directory; profiles never share a file.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(profile_dir: &Path) -> Self {
        Self {
            path: profile_dir.join(SESSION_FILE),
        }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Storage(e.to_string())),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| ClientError::Storage(format!("Corrupt session file: {}", e)))
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ClientError::Storage(e.to_string()))?;
        }
        let raw =
            serde_json::to_vec(session).map_err(|e| ClientError::Storage(e.to_string()))?;

        // Readers never observe a half-written pair
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| ClientError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ClientError::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}

struct StoreInner {
    session: RwLock<Option<StoredSession>>,
    storage: Box<dyn SessionStorage>,
    /// Held while writing to `storage`
    persist_lock: Mutex<()>,
}

/// Shared handle to the credential store. Cloning shares the same state.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<StoreInner>,
}

impl CredentialStore {
    /// Open a store over `storage`, restoring a previously saved session.
    ///
    /// An unreadable session is discarded and the store starts logged out.
    pub fn open(storage: Box<dyn SessionStorage>) -> Self {
        let restored = match storage.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable saved session");
                if let Err(e) = storage.clear() {
                    tracing::warn!(error = %e, "Failed to remove unreadable session");
                }
                None
            }
        };

        if let Some(session) = &restored {
            tracing::debug!(username = %session.identity.username, "Restored saved session");
        }

        Self {
            inner: Arc::new(StoreInner {
                session: RwLock::new(restored),
                storage,
                persist_lock: Mutex::new(()),
            }),
        }
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::open(Box::<MemoryStorage>::default())
    }

    /// Store persisted in `profile_dir`.
    pub fn in_profile(profile_dir: &Path) -> Self {
        Self::open(Box::new(FileStorage::new(profile_dir)))
    }

    /// Replace the whole session with a new pair and identity.
    pub fn set(&self, pair: CredentialPair, identity: Identity) {
        let session = StoredSession {
            credentials: pair,
            identity,
            saved_at: chrono::Utc::now(),
        };

        *self.inner.session.write() = Some(session);
        self.persist();
    }

    /// Current pair, or `None` when logged out.
    pub fn get(&self) -> Option<CredentialPair> {
        self.inner
            .session
            .read()
            .as_ref()
            .map(|s| s.credentials.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .as_ref()
            .map(|s| s.credentials.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .as_ref()
            .map(|s| s.credentials.refresh_token.clone())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner
            .session
            .read()
            .as_ref()
            .map(|s| s.identity.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.session.read().is_some()
    }

    /// Swap in refreshed tokens, but only if the session still holds
    /// `expected_refresh`. Returns false when a logout or new login won the race.
    pub fn replace_tokens(
        &self,
        expected_refresh: &str,
        access_token: String,
        refresh_token: Option<String>,
    ) -> bool {
        {
            let mut current = self.inner.session.write();
            let Some(session) = current.as_ref() else {
                return false;
            };
            if session.credentials.refresh_token != expected_refresh {
                return false;
            }

            let refresh_token =
                refresh_token.unwrap_or_else(|| session.credentials.refresh_token.clone());
            *current = Some(StoredSession {
                credentials: CredentialPair::new(access_token, refresh_token),
                identity: session.identity.clone(),
                saved_at: chrono::Utc::now(),
            });
        }

        self.persist();
        true
    }

    /// Drop credentials and identity together. Idempotent.
    pub fn clear(&self) {
        self.inner.session.write().take();
        self.persist();
    }

    /// Bring storage in line with the in-memory session.
    fn persist(&self) {
        let _writing = self.inner.persist_lock.lock();
        let snapshot = self.inner.session.read().clone();

        // The in-memory session stays authoritative for this run
        let result = match &snapshot {
            Some(session) => self.inner.storage.save(session),
            None => self.inner.storage.clear(),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist session");
        }
    }
}
