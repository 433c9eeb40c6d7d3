//! # Backend trait — the BaaS collaborator
//!
//! Everything the session layer asks of the hosted backend goes through
//! [`Backend`]: profile lookup by user id, the current auth session, and the
//! sign-in / sign-up / sign-out calls. [`crate::RestBackend`] talks to the real
//! service; tests use the recording fake in `crate::testing`.
//!
//! Futures are not required to be `Send`: the client runs on a single-threaded
//! browser event loop.

use std::future::Future;

use store::Role;

use crate::error::Result;
use crate::models::UserProfile;

/// An authenticated BaaS session.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user_id: String,
    pub access_token: String,
}

/// Self-registration request.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

/// Async interface to the hosted backend.
pub trait Backend {
    /// Profile row for `user_id`, or `None` if the row does not exist.
    fn fetch_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserProfile>>>;
    fn current_session(&self) -> impl Future<Output = Result<Option<AuthSession>>>;
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession>>;
    /// Create the account and its profile row, returning the new session.
    fn sign_up(&self, account: &SignUp) -> impl Future<Output = Result<AuthSession>>;
    fn sign_out(&self) -> impl Future<Output = Result<()>>;
}
