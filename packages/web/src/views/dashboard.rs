//! Role dashboards, each behind a route guard.

use api::ApprovalStatus;
use dioxus::prelude::*;
use store::Role;
use ui::{use_auth, SecureRouteGuard, SignOutButton};

#[component]
fn DashboardShell(title: String, children: Element) -> Element {
    let auth = use_auth();
    let state = auth();
    let name = state.display_name().unwrap_or("there").to_string();
    let pending = state
        .profile
        .as_ref()
        .is_some_and(|p| p.status == ApprovalStatus::Pending);

    rsx! {
        div {
            class: "dashboard",
            header {
                class: "dashboard-header",
                h1 { "{title}" }
                span { "Hello, {name}" }
                SignOutButton { class: "dashboard-sign-out" }
            }
            if pending {
                p {
                    class: "dashboard-notice",
                    "Your account is awaiting approval."
                }
            }
            {children}
        }
    }
}

#[component]
pub fn CustomerDashboard() -> Element {
    rsx! {
        SecureRouteGuard {
            allowed_roles: vec![Role::Customer],
            DashboardShell { title: "My bookings" }
        }
    }
}

#[component]
pub fn ProviderDashboard() -> Element {
    rsx! {
        SecureRouteGuard {
            allowed_roles: vec![Role::Provider],
            DashboardShell { title: "Provider dashboard" }
        }
    }
}

#[component]
pub fn AdminDashboard() -> Element {
    rsx! {
        SecureRouteGuard {
            allowed_roles: vec![Role::Admin, Role::SuperAdmin],
            DashboardShell { title: "Administration" }
        }
    }
}

/// Nested admin pages share the admin guard.
#[component]
pub fn AdminSection(segments: Vec<String>) -> Element {
    let section = segments.join("/");
    rsx! {
        SecureRouteGuard {
            allowed_roles: vec![Role::Admin, Role::SuperAdmin],
            DashboardShell {
                title: "Administration",
                p { "Section: {section}" }
            }
        }
    }
}
