//! Authentication context and hooks for the UI.

use api::{Backend, UserProfile};
use dioxus::prelude::*;
use store::SessionRecord;

use crate::guard::{post_login_target, Redirect, LOGIN_PATH};
use crate::services::use_services;

/// Authentication state for the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub session: Option<SessionRecord>,
    pub profile: Option<UserProfile>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            session: None,
            profile: None,
            loading: true,
        }
    }
}

impl AuthState {
    pub fn signed_in(session: SessionRecord, profile: Option<UserProfile>) -> Self {
        Self {
            session: Some(session),
            profile,
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            session: None,
            profile: None,
            loading: false,
        }
    }

    /// Name to greet the user with.
    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref().map(UserProfile::display_name)
    }

    /// State to switch to before following `redirect`. `None` keeps this one.
    pub fn following(&self, redirect: &Redirect) -> Option<AuthState> {
        (redirect.sign_out && self.session.is_some()).then(AuthState::signed_out)
    }

    /// Where the login page forwards a user who is already signed in.
    pub fn resume_target(&self, redirect: Option<&str>) -> Option<String> {
        if self.loading {
            return None;
        }
        self.session
            .as_ref()
            .map(|session| post_login_target(redirect, session.role))
    }
}

/// Get the current authentication state.
/// Returns a signal that updates when the user signs in or out.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// Provider component that manages authentication state.
/// Must sit inside the services context.
#[component]
pub fn AuthProvider(children: Element) -> Element {
    let services = use_services();
    let mut auth_state = use_signal(AuthState::default);

    // Drop a cached session whose backend session is gone, then load the profile
    let _ = use_resource(move || {
        let services = services.clone();
        async move {
            let Some(session) =
                api::reconcile_auth_session(&services.backend, &services.sessions).await
            else {
                auth_state.set(AuthState::signed_out());
                return;
            };

            let profile = match services.backend.fetch_profile(&session.user_id).await {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!("Failed to load profile: {}", e);
                    None
                }
            };
            auth_state.set(AuthState::signed_in(session, profile));
        }
    });

    use_context_provider(|| auth_state);

    rsx! {
        {children}
    }
}

/// Button to sign the current user out.
#[component]
pub fn SignOutButton(
    #[props(default = "Sign out".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let services = use_services();
    let mut auth_state = use_auth();
    let nav = use_navigator();
    let mut busy = use_signal(|| false);

    let onclick = move |_| {
        let services = services.clone();
        async move {
            busy.set(true);
            api::sign_out(&services.backend, &services.sessions).await;
            auth_state.set(AuthState::signed_out());
            nav.replace(LOGIN_PATH);
        }
    };

    rsx! {
        button {
            class: "{class}",
            disabled: busy(),
            onclick: onclick,
            "{label}"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use api::testing::FakeBackend;
    use api::SessionValidator;
    use store::{GuardConfig, MemoryStorage, Role, SessionStore};

    use crate::guard::{evaluate, AccessPolicy, GuardState};
    use crate::monitor::{MonitorExit, SecurityMonitor};

    const NOW: i64 = 1_000_000_000;

    fn follow(auth: &AuthState, redirect: &Redirect) -> AuthState {
        auth.following(redirect).unwrap_or_else(|| auth.clone())
    }

    #[tokio::test]
    async fn test_demoted_user_is_not_forwarded_to_old_dashboard() {
        // Server says customer, the cached record still says admin.
        let backend = FakeBackend::new().with_user("u1", "u1@x.io", "pw", Role::Customer);
        let sessions = SessionStore::new(MemoryStorage::new());
        let stale = SessionRecord::new("u1", Role::Admin, "s1", NOW - 10 * 60 * 1000);
        sessions.set_session(&stale);
        let auth = AuthState::signed_in(stale, None);
        assert_eq!(
            auth.resume_target(Some("/dashboard/admin")).as_deref(),
            Some("/dashboard/admin")
        );

        let validator = SessionValidator::new(backend, Duration::from_secs(300));
        let policy = AccessPolicy::roles(vec![Role::Admin, Role::SuperAdmin]);
        let state = evaluate(&sessions, &validator, &policy, "/dashboard/admin", NOW).await;
        assert!(matches!(state, GuardState::RedirectLogin(_)));

        let after = follow(&auth, &state.redirect().unwrap());
        assert_eq!(after, AuthState::signed_out());
        assert_eq!(after.resume_target(Some("/dashboard/admin")), None);
    }

    #[tokio::test]
    async fn test_tampered_session_signs_out_to_login() {
        let sessions = SessionStore::new(MemoryStorage::new());
        let own = SessionRecord::new("u1", Role::Customer, "S1", NOW);
        sessions.set_session(&own);
        let auth = AuthState::signed_in(own, None);

        sessions.set_session(&SessionRecord::new("u2", Role::Admin, "S2", NOW));
        let tick = Duration::from_millis(10);
        let exit = SecurityMonitor::new(sessions.clone(), "S1", &GuardConfig::default())
            .with_timings(tick, tick)
            .run(|| {})
            .await;
        assert_eq!(exit, MonitorExit::Tampered);

        let redirect = exit.redirect().unwrap();
        assert_eq!(redirect.target, LOGIN_PATH);
        let after = follow(&auth, &redirect);
        assert_eq!(after, AuthState::signed_out());
        assert_eq!(after.resume_target(None), None);
    }

    #[test]
    fn test_dashboard_redirect_keeps_auth_state() {
        let auth = AuthState::signed_in(SessionRecord::new("u1", Role::Provider, "s1", NOW), None);
        let redirect = GuardState::RedirectDashboard("/dashboard/provider".to_string())
            .redirect()
            .unwrap();
        assert_eq!(auth.following(&redirect), None);
    }

    #[test]
    fn test_resume_waits_for_auth_to_load() {
        let mut auth = AuthState::signed_in(SessionRecord::new("u1", Role::Provider, "s1", NOW), None);
        auth.loading = true;
        assert_eq!(auth.resume_target(None), None);

        auth.loading = false;
        assert_eq!(auth.resume_target(None).as_deref(), Some("/dashboard/provider"));
    }
}
