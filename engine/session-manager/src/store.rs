//! On-disk store for encrypted session material.
//!
//! One JSON file keyed by account id. Tokens are already encrypted by the
//! time they reach this layer; plaintext never touches disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

/// Persisted session record for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub account_id: String,
    pub encrypted_session_token: String,
    pub encrypted_csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consecutive_failures: u32,
}

/// File-backed map of account id to [`StoredSession`].
pub struct SessionStore {
    path: PathBuf,
    sessions: Mutex<HashMap<String, StoredSession>>,
}

impl SessionStore {
    /// Open the store, loading any previously persisted sessions. A
    /// missing file is an empty store; a corrupt file is logged and
    /// treated as empty rather than blocking startup.
    pub fn open(path: PathBuf) -> crate::Result<Self> {
        let sessions = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<HashMap<String, StoredSession>>(&raw) {
                Ok(sessions) => {
                    info!(count = sessions.len(), "loaded persisted sessions");
                    sessions
                }
                Err(e) => {
                    warn!(error = %e, "session state file unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        Ok(Self { path, sessions: Mutex::new(sessions) })
    }

    pub fn get(&self, account_id: &str) -> Option<StoredSession> {
        self.sessions.lock().ok()?.get(account_id).cloned()
    }

    /// Insert or replace the record for an account and persist the file.
    pub fn upsert(&self, session: StoredSession) -> crate::Result<()> {
        let snapshot = {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| std::io::Error::other("session store lock poisoned"))?;
            sessions.insert(session.account_id.clone(), session);
            sessions.clone()
        };
        self.save(&snapshot)
    }

    /// Drop the record for an account and persist the file.
    pub fn remove(&self, account_id: &str) -> crate::Result<()> {
        let snapshot = {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| std::io::Error::other("session store lock poisoned"))?;
            sessions.remove(account_id);
            sessions.clone()
        };
        self.save(&snapshot)
    }

    fn save(&self, sessions: &HashMap<String, StoredSession>) -> crate::Result<()> {
        let serialized = serde_json::to_string_pretty(sessions)?;
        std::fs::write(&self.path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(account_id: &str, failures: u32) -> StoredSession {
        let now = Utc::now();
        StoredSession {
            account_id: account_id.to_string(),
            encrypted_session_token: "enc-sid".to_string(),
            encrypted_csrf_token: "enc-csrf".to_string(),
            created_at: now,
            expires_at: now + Duration::hours(1),
            consecutive_failures: failures,
        }
    }

    #[test]
    fn round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let store = SessionStore::open(path.clone()).unwrap();
        store.upsert(record("7", 1)).unwrap();
        drop(store);

        let reopened = SessionStore::open(path).unwrap();
        let loaded = reopened.get("7").unwrap();
        assert_eq!(loaded.encrypted_session_token, "enc-sid");
        assert_eq!(loaded.consecutive_failures, 1);
    }

    #[test]
    fn remove_persists_the_deletion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let store = SessionStore::open(path.clone()).unwrap();
        store.upsert(record("7", 0)).unwrap();
        store.remove("7").unwrap();
        drop(store);

        let reopened = SessionStore::open(path).unwrap();
        assert!(reopened.get("7").is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = SessionStore::open(path).unwrap();
        assert!(store.get("7").is_none());
    }
}
