//! Role-restricted route wrapper.
//!
//! [`SecureRouteGuard`] renders its children only after [`crate::guard::evaluate`]
//! grants access, and replaces the current route otherwise. While granted with a
//! session it also mounts a [`SessionWatch`], which runs the tamper monitor for as
//! long as the guarded view is on screen.

use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use store::{now_millis, Role};

use crate::auth::use_auth;
use crate::guard::{evaluate, on_signed_out, AccessPolicy, GuardKey, GuardState, ValidationGate};
use crate::monitor::SecurityMonitor;
use crate::services::use_services;

/// Guard a route for the given roles.
///
/// With `require_auth: false` the children render for anyone; the guard then
/// only attaches the tamper monitor when a session happens to exist.
#[component]
pub fn SecureRouteGuard(
    allowed_roles: Vec<Role>,
    #[props(default = true)] require_auth: bool,
    children: Element,
) -> Element {
    let services = use_services();
    let mut auth_state = use_auth();
    let nav = use_navigator();
    let path = router().full_route_string();
    let policy = AccessPolicy::new(allowed_roles, require_auth);

    let mut state = use_signal(|| GuardState::Validating);
    let gate = use_hook(|| Rc::new(RefCell::new(ValidationGate::default())));

    // Re-validate on mount and whenever the policy or the path changes
    let _validation = use_resource({
        let policy = policy.clone();
        let path = path.clone();
        use_reactive!(|(policy, path)| {
        let services = services.clone();
        let gate = gate.clone();
        async move {
            let key = GuardKey::new(&policy, &path);
            if !gate.borrow_mut().try_begin(&key) {
                return;
            }
            state.set(GuardState::Validating);

            let validator = services.validator();
            let outcome = evaluate(&services.sessions, &validator, &policy, &path, now_millis()).await;

            if gate.borrow_mut().finish(&key) {
                state.set(outcome);
            }
        }
    })
    });

    // A session that ends while the view is granted sends the user to login
    use_effect(use_reactive!(|(policy, path)| {
        let auth = auth_state();
        if auth.loading || auth.session.is_some() {
            return;
        }
        let next = on_signed_out(&state.peek(), &policy, &path);
        if let Some(next) = next {
            tracing::info!("Session ended while viewing {path}");
            state.set(next);
        }
    }));

    use_effect(move || {
        let Some(redirect) = state().redirect() else {
            return;
        };
        let next_auth = auth_state.peek().following(&redirect);
        if let Some(next_auth) = next_auth {
            auth_state.set(next_auth);
        }
        tracing::debug!("Route guard redirecting to {}", redirect.target);
        nav.replace(redirect.target);
    });

    match state() {
        GuardState::Validating => rsx! {
            div {
                class: "route-guard route-guard--validating",
                "Checking your session..."
            }
        },
        GuardState::Granted { session: Some(session) } => rsx! {
            SessionWatch {
                key: "{session.session_id}",
                session_id: session.session_id.clone(),
            }
            {children}
        },
        GuardState::Granted { session: None } => rsx! {
            {children}
        },
        GuardState::RedirectDashboard(_) | GuardState::RedirectLogin(_) => rsx! {},
    }
}

/// Runs the tamper monitor for one granted session and shows the alert.
#[component]
fn SessionWatch(session_id: String) -> Element {
    let services = use_services();
    let mut auth_state = use_auth();
    let nav = use_navigator();
    let mut alert = use_signal(|| false);

    // Owned by this scope: unmounting cancels the poll and the emergency delay
    use_hook(move || {
        let monitor = SecurityMonitor::new(services.sessions.clone(), session_id, &services.config);
        spawn(async move {
            let Some(redirect) = monitor.run(move || alert.set(true)).await.redirect() else {
                return;
            };
            let next_auth = auth_state.peek().following(&redirect);
            if let Some(next_auth) = next_auth {
                auth_state.set(next_auth);
            }
            nav.replace(redirect.target);
        })
    });

    if !alert() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "security-alert",
            role: "alert",
            strong { "Security warning" }
            p {
                "Your session was changed outside this page. You will be signed out in a moment."
            }
        }
    }
}
