//! # Session lifecycle
//!
//! Creates and destroys the cached [`SessionRecord`] around BaaS auth calls:
//!
//! - [`sign_in`] / [`sign_up`] store a fresh record (new v4 session id,
//!   `last_validated = now`) once the profile role is known.
//! - [`sign_out`] raises the logout flag before touching anything, so a running
//!   tamper monitor stands down instead of racing the cleanup.
//! - [`reconcile_auth_session`] drops a record whose BaaS session is gone, the
//!   same way a sign-out does, so the monitor treats it as a logout.

use store::{now_millis, SessionRecord, SessionStore, Storage};
use uuid::Uuid;

use crate::backend::{AuthSession, Backend, SignUp};
use crate::error::{ApiError, Result};
use crate::models::UserProfile;

/// A stored session together with the profile it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub record: SessionRecord,
    pub profile: UserProfile,
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

async fn establish<B: Backend, S: Storage>(
    backend: &B,
    sessions: &SessionStore<S>,
    auth: AuthSession,
) -> Result<SignedIn> {
    let profile = backend
        .fetch_profile(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::ProfileNotFound(auth.user_id.clone()))?;

    let record = SessionRecord::new(profile.id.clone(), profile.role, new_session_id(), now_millis());
    sessions.set_session(&record);
    tracing::info!("Signed in user {} as {}", record.user_id, record.role);
    Ok(SignedIn { record, profile })
}

/// Sign in with email and password.
pub async fn sign_in<B: Backend, S: Storage>(
    backend: &B,
    sessions: &SessionStore<S>,
    email: &str,
    password: &str,
) -> Result<SignedIn> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::InvalidCredentials);
    }
    let auth = backend.sign_in(&email, password).await?;
    establish(backend, sessions, auth).await
}

impl SignUp {
    /// Normalise and check a registration request.
    pub fn validated(self) -> Result<Self> {
        let email = self.email.trim().to_lowercase();
        let display_name = self.display_name.trim().to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        if self.password.len() < 8 {
            return Err(ApiError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        if display_name.is_empty() {
            return Err(ApiError::Validation("Name is required".to_string()));
        }
        if !self.role.is_self_service() {
            return Err(ApiError::Forbidden(self.role));
        }

        Ok(Self {
            email,
            display_name,
            ..self
        })
    }
}

/// Register a customer or provider account and sign it in.
pub async fn sign_up<B: Backend, S: Storage>(
    backend: &B,
    sessions: &SessionStore<S>,
    account: SignUp,
) -> Result<SignedIn> {
    let account = account.validated()?;
    let auth = backend.sign_up(&account).await?;
    establish(backend, sessions, auth).await
}

/// Sign out. The store is empty afterwards even if the backend call fails.
pub async fn sign_out<B: Backend, S: Storage>(backend: &B, sessions: &SessionStore<S>) {
    sessions.set_logout_in_progress(true);
    if let Err(e) = backend.sign_out().await {
        tracing::warn!("Backend sign-out failed, clearing local session anyway: {e}");
    }
    sessions.clear_session();
    tracing::info!("Signed out");
}

/// Drop the cached record when the backend no longer holds a matching auth
/// session. Returns the record that survives, if any.
pub async fn reconcile_auth_session<B: Backend, S: Storage>(
    backend: &B,
    sessions: &SessionStore<S>,
) -> Option<SessionRecord> {
    let record = sessions.get_session()?;
    match backend.current_session().await {
        Ok(Some(auth)) if auth.user_id == record.user_id => Some(record),
        Ok(_) => {
            tracing::info!("Auth session for user {} is gone, clearing", record.user_id);
            sessions.expire_session();
            None
        }
        Err(e) => {
            tracing::warn!("Could not confirm auth session, keeping cached record: {e}");
            Some(record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use store::{MemoryStorage, Role};

    fn sessions() -> SessionStore<MemoryStorage> {
        SessionStore::new(MemoryStorage::new())
    }

    fn account(role: Role) -> SignUp {
        SignUp {
            email: " New@Example.com ".to_string(),
            password: "longenough".to_string(),
            display_name: " Nia ".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_sign_in_stores_fresh_record() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Provider);
        let sessions = sessions();
        sessions.set_logout_in_progress(true);

        let SignedIn { record, profile } =
            sign_in(&backend, &sessions, "A@x.io", "secret").await.unwrap();
        assert_eq!(profile.email, "a@x.io");
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.role, Role::Provider);
        assert!(!record.session_id.is_empty());
        assert_eq!(sessions.get_session(), Some(record));
        assert!(!sessions.logout_in_progress());
    }

    #[tokio::test]
    async fn test_sign_in_new_session_id_each_time() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        let sessions = sessions();
        let first = sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();
        let second = sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();
        assert_ne!(first.record.session_id, second.record.session_id);
        assert_eq!(sessions.get_session(), Some(second.record));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        let sessions = sessions();
        let err = sign_in(&backend, &sessions, "a@x.io", "nope").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
        assert!(sessions.get_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_without_profile() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        backend.remove_profile("u1");
        let sessions = sessions();
        let err = sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::ProfileNotFound(_)));
        assert!(sessions.get_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_provider_starts_pending() {
        let backend = FakeBackend::new();
        let sessions = sessions();
        let signed_in = sign_up(&backend, &sessions, account(Role::Provider)).await.unwrap();
        assert_eq!(signed_in.record.role, Role::Provider);

        let profile = backend.profile(&signed_in.record.user_id).unwrap();
        assert_eq!(profile, signed_in.profile);
        assert_eq!(profile.email, "new@example.com");
        assert_eq!(profile.display_name(), "Nia");
        assert_eq!(profile.status, crate::models::ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_admin_roles() {
        let backend = FakeBackend::new();
        let sessions = sessions();
        for role in [Role::Admin, Role::SuperAdmin] {
            let err = sign_up(&backend, &sessions, account(role)).await.unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(r) if r == role));
        }
        assert!(sessions.get_session().is_none());
    }

    #[test]
    fn test_sign_up_validation() {
        let short = SignUp {
            password: "short".to_string(),
            ..account(Role::Customer)
        };
        assert!(matches!(short.validated(), Err(ApiError::Validation(_))));

        let no_at = SignUp {
            email: "nobody".to_string(),
            ..account(Role::Customer)
        };
        assert!(matches!(no_at.validated(), Err(ApiError::Validation(_))));

        let unnamed = SignUp {
            display_name: "   ".to_string(),
            ..account(Role::Customer)
        };
        assert!(matches!(unnamed.validated(), Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_backend_fails() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        let sessions = sessions();
        sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();

        backend.fail_sign_out(true);
        sign_out(&backend, &sessions).await;

        assert!(sessions.get_session().is_none());
        assert!(sessions.logout_in_progress());
        assert_eq!(backend.sign_outs(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_keeps_matching_session() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        let sessions = sessions();
        let signed_in = sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();
        assert_eq!(
            reconcile_auth_session(&backend, &sessions).await,
            Some(signed_in.record)
        );
    }

    #[tokio::test]
    async fn test_reconcile_clears_when_auth_session_gone() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        let sessions = sessions();
        sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();

        backend.set_session(None);
        assert_eq!(reconcile_auth_session(&backend, &sessions).await, None);
        assert!(sessions.get_session().is_none());
        assert!(sessions.logout_in_progress());
    }

    #[tokio::test]
    async fn test_sign_in_after_expiry_lowers_logout_flag() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        let sessions = sessions();
        sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();
        backend.set_session(None);
        reconcile_auth_session(&backend, &sessions).await;

        sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();
        assert!(!sessions.logout_in_progress());
    }

    #[tokio::test]
    async fn test_reconcile_keeps_record_when_offline() {
        let backend = FakeBackend::new().with_user("u1", "a@x.io", "secret", Role::Customer);
        let sessions = sessions();
        sign_in(&backend, &sessions, "a@x.io", "secret").await.unwrap();

        backend.set_offline(true);
        assert!(reconcile_auth_session(&backend, &sessions).await.is_some());
        assert!(sessions.get_session().is_some());
    }
}
