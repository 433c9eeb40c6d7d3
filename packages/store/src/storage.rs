//! # Key/value storage backends
//!
//! [`Storage`] is the narrow interface the session layer needs from the platform:
//! string values under string keys, shared by every tab of the same origin.
//! Implementations live in sibling modules ([`crate::memory`] and, on the web
//! platform, `crate::local`).
//!
//! All methods are infallible from the caller's point of view. A backend that
//! cannot be reached (private browsing, quota exceeded, no `window`) degrades to
//! "nothing stored": reads return `None` and writes are dropped.

/// Synchronous string key/value storage.
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}
