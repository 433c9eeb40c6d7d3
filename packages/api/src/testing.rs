//! Recording in-memory [`Backend`] for tests.
//!
//! Clones share state, so a test can keep one handle to script responses and
//! inspect call counts while the code under test owns another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use store::Role;

use crate::backend::{AuthSession, Backend, SignUp};
use crate::error::{ApiError, Result};
use crate::models::{ApprovalStatus, UserProfile};

#[derive(Debug, Default)]
struct State {
    profiles: HashMap<String, UserProfile>,
    accounts: HashMap<String, (String, String)>,
    session: Option<AuthSession>,
    offline: bool,
    token_expired: bool,
    fail_sign_out: bool,
    profile_fetches: usize,
    sign_outs: usize,
    next_id: usize,
}

/// Scriptable fake of the hosted backend.
#[derive(Clone, Debug, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an account with a profile of the given role.
    pub fn with_user(self, user_id: &str, email: &str, password: &str, role: Role) -> Self {
        {
            let mut state = self.state();
            state
                .accounts
                .insert(email.to_string(), (password.to_string(), user_id.to_string()));
            state.profiles.insert(
                user_id.to_string(),
                UserProfile {
                    id: user_id.to_string(),
                    role,
                    display_name: None,
                    email: email.to_string(),
                    phone: None,
                    status: ApprovalStatus::Approved,
                },
            );
        }
        self
    }

    /// Change a user's role server-side.
    pub fn set_role(&self, user_id: &str, role: Role) {
        if let Some(profile) = self.state().profiles.get_mut(user_id) {
            profile.role = role;
        }
    }

    pub fn remove_profile(&self, user_id: &str) {
        self.state().profiles.remove(user_id);
    }

    /// Make every call fail with a transport-style error.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Reject the access token on profile reads, as an expired JWT would be.
    pub fn expire_token(&self) {
        self.state().token_expired = true;
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.state().fail_sign_out = fail;
    }

    /// Replace the BaaS-side auth session.
    pub fn set_session(&self, session: Option<AuthSession>) {
        self.state().session = session;
    }

    pub fn profile_fetches(&self) -> usize {
        self.state().profile_fetches
    }

    pub fn sign_outs(&self) -> usize {
        self.state().sign_outs
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.state().profiles.get(user_id).cloned()
    }

    fn offline_error() -> ApiError {
        ApiError::Status {
            status: 503,
            message: "backend unreachable".to_string(),
        }
    }
}

impl Backend for FakeBackend {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let mut state = self.state();
        state.profile_fetches += 1;
        if state.offline {
            return Err(Self::offline_error());
        }
        if state.token_expired {
            return Err(ApiError::Unauthorized);
        }
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn current_session(&self) -> Result<Option<AuthSession>> {
        let state = self.state();
        if state.offline {
            return Err(Self::offline_error());
        }
        Ok(state.session.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut state = self.state();
        if state.offline {
            return Err(Self::offline_error());
        }
        let user_id = match state.accounts.get(email) {
            Some((expected, user_id)) if expected == password => user_id.clone(),
            _ => return Err(ApiError::InvalidCredentials),
        };
        let session = AuthSession {
            access_token: format!("token-{user_id}"),
            user_id,
        };
        state.session = Some(session.clone());
        state.token_expired = false;
        Ok(session)
    }

    async fn sign_up(&self, account: &SignUp) -> Result<AuthSession> {
        let mut state = self.state();
        if state.offline {
            return Err(Self::offline_error());
        }
        if state.accounts.contains_key(&account.email) {
            return Err(ApiError::Status {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        state.next_id += 1;
        let user_id = format!("new-user-{}", state.next_id);
        state.accounts.insert(
            account.email.clone(),
            (account.password.clone(), user_id.clone()),
        );
        state.profiles.insert(
            user_id.clone(),
            UserProfile {
                id: user_id.clone(),
                role: account.role,
                display_name: Some(account.display_name.clone()),
                email: account.email.clone(),
                phone: None,
                status: ApprovalStatus::initial_for(account.role),
            },
        );
        let session = AuthSession {
            access_token: format!("token-{user_id}"),
            user_id,
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let mut state = self.state();
        state.sign_outs += 1;
        state.session = None;
        if state.offline || state.fail_sign_out {
            return Err(Self::offline_error());
        }
        Ok(())
    }
}
