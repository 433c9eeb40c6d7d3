//! # Session store — the cached session record
//!
//! [`SessionStore`] wraps any [`Storage`] and owns the two local-storage keys the
//! guard layer cares about:
//!
//! | Key | Value |
//! |-----|-------|
//! | [`SESSION_KEY`] | JSON-encoded [`SessionRecord`] |
//! | [`LOGOUT_FLAG_KEY`] | `"1"` while a sign-out is running |
//!
//! There is a single session key, so an origin holds at most one record. A value
//! that fails to decode is reported as "no session" and left for the next
//! [`SessionStore::set_session`] or [`SessionStore::clear_session`] to overwrite.
//!
//! No method touches the network.

use serde::{Deserialize, Serialize};

use crate::models::Role;
use crate::storage::Storage;

/// Local-storage key holding the serialized session record.
pub const SESSION_KEY: &str = "marketplace.session";
/// Local-storage key set while a sign-out is clearing state.
pub const LOGOUT_FLAG_KEY: &str = "marketplace.logout_in_progress";

/// Client-cached session tuple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub role: Role,
    pub session_id: String,
    /// Unix epoch milliseconds of the last successful server check.
    pub last_validated: i64,
}

impl SessionRecord {
    pub fn new(user_id: impl Into<String>, role: Role, session_id: impl Into<String>, now: i64) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            session_id: session_id.into(),
            last_validated: now,
        }
    }

    /// Milliseconds since the last server check. Negative when the stored
    /// timestamp lies in the future.
    pub fn age_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.last_validated)
    }
}

/// Session record persistence on top of a [`Storage`] backend.
#[derive(Clone, Debug, Default)]
pub struct SessionStore<S> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying storage, shared with other users of the same origin.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn get_session(&self) -> Option<SessionRecord> {
        let raw = self.storage.get_item(SESSION_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session record: {e}");
                None
            }
        }
    }

    /// Store `record`, replacing any previous one. A fresh session also ends any
    /// sign-out that was in progress.
    pub fn set_session(&self, record: &SessionRecord) {
        match serde_json::to_string(record) {
            Ok(raw) => {
                self.storage.set_item(SESSION_KEY, &raw);
                self.storage.remove_item(LOGOUT_FLAG_KEY);
            }
            Err(e) => tracing::error!("Failed to encode session record: {e}"),
        }
    }

    pub fn clear_session(&self) {
        self.storage.remove_item(SESSION_KEY);
    }

    /// Clear a session that ended normally (expired, revoked, demoted). The
    /// logout flag goes up first so running monitors stop instead of reporting
    /// the missing record as tampering.
    pub fn expire_session(&self) {
        self.set_logout_in_progress(true);
        self.clear_session();
    }

    /// Bump `last_validated` to `now`. Does nothing without a session.
    pub fn update_last_validated(&self, now: i64) {
        let Some(mut record) = self.get_session() else {
            return;
        };
        record.last_validated = now;
        if let Ok(raw) = serde_json::to_string(&record) {
            self.storage.set_item(SESSION_KEY, &raw);
        }
    }

    pub fn logout_in_progress(&self) -> bool {
        self.storage.get_item(LOGOUT_FLAG_KEY).as_deref() == Some("1")
    }

    pub fn set_logout_in_progress(&self, in_progress: bool) {
        if in_progress {
            self.storage.set_item(LOGOUT_FLAG_KEY, "1");
        } else {
            self.storage.remove_item(LOGOUT_FLAG_KEY);
        }
    }
}

/// Current Unix time in milliseconds.
pub fn now_millis() -> i64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as i64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}
