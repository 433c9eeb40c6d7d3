use dioxus::prelude::*;

use api::ClientConfig;
use store::GuardConfig;
use ui::{dashboard_path, use_auth, AuthProvider, Services, LOGIN_PATH};
use views::{
    AdminDashboard, AdminSection, CustomerDashboard, Login, NotFound, ProviderDashboard, Register,
};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    Root {},
    #[route("/auth?:redirect")]
    Login { redirect: String },
    #[route("/auth/register")]
    Register {},
    #[route("/dashboard/customer")]
    CustomerDashboard {},
    #[route("/dashboard/provider")]
    ProviderDashboard {},
    #[route("/dashboard/admin")]
    AdminDashboard {},
    #[route("/dashboard/admin/:..segments")]
    AdminSection { segments: Vec<String> },
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

fn main() {
    dioxus::launch(App);
}

/// Public client keys: baked in for the browser, read from `.env` elsewhere.
fn load_client_config() -> Result<ClientConfig, String> {
    #[cfg(target_arch = "wasm32")]
    let config = ClientConfig::from_build_env();
    #[cfg(not(target_arch = "wasm32"))]
    let config = ClientConfig::from_env();

    config.map_err(|e| e.to_string())
}

/// Guard timings from the `GUARD_CONFIG` TOML captured at build time.
fn load_guard_config() -> GuardConfig {
    let Some(text) = option_env!("GUARD_CONFIG") else {
        return GuardConfig::default();
    };
    GuardConfig::from_toml(text).unwrap_or_else(|e| {
        tracing::warn!("Ignoring invalid GUARD_CONFIG: {}", e);
        GuardConfig::default()
    })
}

#[component]
fn App() -> Element {
    let client = use_hook(load_client_config);

    match client {
        Ok(client) => rsx! {
            Configured { client }
        },
        Err(message) => rsx! {
            div {
                class: "config-error",
                h1 { "Marketplace is not configured" }
                p { "{message}" }
            }
        },
    }
}

/// Provides services and auth state to the router.
#[component]
fn Configured(client: ClientConfig) -> Element {
    use_context_provider(|| Services::new(client.clone(), load_guard_config()));

    rsx! {
        AuthProvider {
            Router::<Route> {}
        }
    }
}

/// Redirect `/` to the signed-in user's dashboard, or to login.
#[component]
fn Root() -> Element {
    let auth = use_auth();
    let nav = use_navigator();

    use_effect(move || {
        let state = auth();
        if state.loading {
            return;
        }
        match state.session {
            Some(session) => nav.replace(dashboard_path(session.role)),
            None => nav.replace(LOGIN_PATH),
        };
    });

    rsx! {}
}
