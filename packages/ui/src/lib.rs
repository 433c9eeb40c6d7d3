//! This crate contains the shared session guard UI for the workspace.
//!
//! The decision logic ([`guard`], [`monitor`]) is plain async Rust over the
//! `store` and `api` traits; the components wrap it for Dioxus.

pub mod guard;
pub mod monitor;

mod time;

mod services;
pub use services::{use_services, AppBackend, AppStorage, Services};

mod auth;
pub use auth::{use_auth, AuthProvider, AuthState, SignOutButton};

mod secure_route;
pub use secure_route::SecureRouteGuard;

pub use guard::{
    dashboard_path, login_path, post_login_target, AccessPolicy, GuardState, Redirect, LOGIN_PATH,
};
