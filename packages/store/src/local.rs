//! # Browser local storage
//!
//! [`LocalStorage`] is the [`Storage`] implementation used on the **web platform**.
//! It talks to `window.localStorage` through `web_sys`, so every tab of the same
//! origin sees the same values on its next read. There is no cross-tab locking.
//!
//! ## Error handling
//!
//! `window.localStorage` can be missing (no window, sandboxed iframe) or throw
//! (private browsing, quota exceeded). Every method swallows those failures: a
//! read yields `None`, a write does nothing. For the session layer this means an
//! unavailable storage looks exactly like "no session".

use crate::storage::Storage;

/// `window.localStorage`-backed Storage.
///
/// Zero-size and `Clone`-friendly: the handle is looked up on every call, the
/// browser keeps it cached.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn handle(&self) -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.handle()?.get_item(key).ok()?
    }

    fn set_item(&self, key: &str, value: &str) {
        let Some(storage) = self.handle() else {
            tracing::warn!("localStorage unavailable, dropping write to {key}");
            return;
        };
        if storage.set_item(key, value).is_err() {
            tracing::warn!("localStorage rejected write to {key}");
        }
    }

    fn remove_item(&self, key: &str) {
        let Some(storage) = self.handle() else {
            tracing::warn!("localStorage unavailable, dropping removal of {key}");
            return;
        };
        if storage.remove_item(key).is_err() {
            tracing::warn!("localStorage rejected removal of {key}");
        }
    }
}
