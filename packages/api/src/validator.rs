//! # Session validator
//!
//! Reconciles the role cached in a [`SessionRecord`] with the server's profile
//! row, on a time-boxed cache policy:
//!
//! 1. No record: invalid ([`InvalidReason::NoSession`]).
//! 2. Record checked less than `cache_window` ago: valid from cache, no request.
//! 3. Otherwise fetch the profile. A different role is invalid
//!    ([`InvalidReason::RoleMismatch`]), a missing row is invalid
//!    ([`InvalidReason::ProfileNotFound`]), a matching role is valid.
//! 4. A rejected access token is invalid ([`InvalidReason::SessionExpired`]).
//! 5. Any other failed fetch keeps the cached role (valid,
//!    [`ValidationSource::Degraded`]).
//!
//! A demoted user can therefore keep stale access on the client for up to one
//! cache window, and for the length of any backend outage. An expired token is
//! not an outage: it ends the session. Server-side authorisation is what
//! actually protects data.
//!
//! The validator never writes to the store. Callers clear the session on an
//! invalid result and bump `last_validated` on [`ValidationSource::Server`].

use std::fmt;
use std::time::Duration;

use store::SessionRecord;

use crate::backend::Backend;
use crate::error::ApiError;

/// Why a session failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    NoSession,
    RoleMismatch,
    ProfileNotFound,
    /// The backend no longer accepts the session's access token.
    SessionExpired,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvalidReason::NoSession => "no session",
            InvalidReason::RoleMismatch => "role mismatch",
            InvalidReason::ProfileNotFound => "profile not found",
            InvalidReason::SessionExpired => "session expired",
        })
    }
}

/// Where a positive verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSource {
    /// Inside the cache window; the server was not asked.
    Cache,
    /// The server confirmed the cached role.
    Server,
    /// The server could not be reached; the cached role was trusted.
    Degraded,
}

/// Outcome of [`SessionValidator::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid(ValidationSource),
    Invalid(InvalidReason),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Validation::Invalid(reason) => Some(*reason),
            Validation::Valid(_) => None,
        }
    }
}

/// Checks cached session records against the backend.
#[derive(Debug, Clone)]
pub struct SessionValidator<B> {
    backend: B,
    cache_window: Duration,
}

impl<B: Backend> SessionValidator<B> {
    pub fn new(backend: B, cache_window: Duration) -> Self {
        Self {
            backend,
            cache_window,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether `record` was validated recently enough to skip the server.
    /// A `last_validated` in the future never counts as fresh.
    pub fn is_fresh(&self, record: &SessionRecord, now: i64) -> bool {
        let age = record.age_millis(now);
        let window = i64::try_from(self.cache_window.as_millis()).unwrap_or(i64::MAX);
        (0..window).contains(&age)
    }

    pub async fn validate(&self, record: Option<&SessionRecord>, now: i64) -> Validation {
        let Some(record) = record else {
            return Validation::Invalid(InvalidReason::NoSession);
        };

        if self.is_fresh(record, now) {
            tracing::debug!("Session {} inside cache window", record.session_id);
            return Validation::Valid(ValidationSource::Cache);
        }

        match self.backend.fetch_profile(&record.user_id).await {
            Ok(Some(profile)) if profile.role == record.role => {
                Validation::Valid(ValidationSource::Server)
            }
            Ok(Some(profile)) => {
                tracing::info!(
                    "Cached role {} for user {} no longer matches server role {}",
                    record.role,
                    record.user_id,
                    profile.role
                );
                Validation::Invalid(InvalidReason::RoleMismatch)
            }
            Ok(None) => {
                tracing::info!("No profile for user {}", record.user_id);
                Validation::Invalid(InvalidReason::ProfileNotFound)
            }
            Err(ApiError::Unauthorized) => {
                tracing::info!("Access token for user {} was rejected", record.user_id);
                Validation::Invalid(InvalidReason::SessionExpired)
            }
            Err(e) => {
                tracing::warn!(
                    "Role check for user {} failed, trusting cached role {}: {e}",
                    record.user_id,
                    record.role
                );
                Validation::Valid(ValidationSource::Degraded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use store::Role;

    const MINUTE: i64 = 60 * 1000;

    fn validator(backend: &FakeBackend) -> SessionValidator<FakeBackend> {
        SessionValidator::new(backend.clone(), Duration::from_secs(300))
    }

    fn record(role: Role, last_validated: i64) -> SessionRecord {
        SessionRecord::new("u1", role, "s1", last_validated)
    }

    #[tokio::test]
    async fn test_no_record_is_invalid() {
        let backend = FakeBackend::new();
        let verdict = validator(&backend).validate(None, 0).await;
        assert_eq!(verdict, Validation::Invalid(InvalidReason::NoSession));
        assert_eq!(verdict.reason().map(|r| r.to_string()).as_deref(), Some("no session"));
    }

    #[tokio::test]
    async fn test_cache_window_skips_network() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "pw", Role::Customer);
        let validator = validator(&backend);
        let start = 10 * MINUTE;

        for elapsed in [0, 1, MINUTE, 4 * MINUTE, 5 * MINUTE - 1] {
            let verdict = validator
                .validate(Some(&record(Role::Customer, start)), start + elapsed)
                .await;
            assert_eq!(verdict, Validation::Valid(ValidationSource::Cache));
        }
        assert_eq!(backend.profile_fetches(), 0);
    }

    #[tokio::test]
    async fn test_expired_window_checks_server() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "pw", Role::Customer);
        let verdict = validator(&backend)
            .validate(Some(&record(Role::Customer, 0)), 5 * MINUTE)
            .await;
        assert_eq!(verdict, Validation::Valid(ValidationSource::Server));
        assert_eq!(backend.profile_fetches(), 1);
    }

    #[tokio::test]
    async fn test_role_mismatch_is_invalid() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "pw", Role::Customer);
        let verdict = validator(&backend)
            .validate(Some(&record(Role::Admin, 0)), 6 * MINUTE)
            .await;
        assert_eq!(verdict, Validation::Invalid(InvalidReason::RoleMismatch));
    }

    #[tokio::test]
    async fn test_missing_profile_is_invalid() {
        let backend = FakeBackend::new();
        let verdict = validator(&backend)
            .validate(Some(&record(Role::Customer, 0)), 6 * MINUTE)
            .await;
        assert_eq!(verdict, Validation::Invalid(InvalidReason::ProfileNotFound));
    }

    #[tokio::test]
    async fn test_network_failure_degrades_to_cached_role() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "pw", Role::Customer);
        backend.set_offline(true);
        let verdict = validator(&backend)
            .validate(Some(&record(Role::Admin, 0)), 6 * MINUTE)
            .await;
        assert_eq!(verdict, Validation::Valid(ValidationSource::Degraded));
    }

    #[tokio::test]
    async fn test_rejected_token_is_invalid() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "pw", Role::Admin);
        backend.expire_token();
        let verdict = validator(&backend)
            .validate(Some(&record(Role::Admin, 0)), 60 * MINUTE)
            .await;
        assert_eq!(verdict, Validation::Invalid(InvalidReason::SessionExpired));
    }

    #[tokio::test]
    async fn test_rejected_token_inside_cache_window_stays_cached() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "pw", Role::Admin);
        backend.expire_token();
        let verdict = validator(&backend)
            .validate(Some(&record(Role::Admin, 0)), MINUTE)
            .await;
        assert_eq!(verdict, Validation::Valid(ValidationSource::Cache));
    }

    #[tokio::test]
    async fn test_future_timestamp_is_not_fresh() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "pw", Role::Customer);
        let verdict = validator(&backend)
            .validate(Some(&record(Role::Customer, 10 * MINUTE)), MINUTE)
            .await;
        assert_eq!(verdict, Validation::Valid(ValidationSource::Server));
        assert_eq!(backend.profile_fetches(), 1);
    }
}
