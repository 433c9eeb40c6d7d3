//! Login page view with email/password form.

use dioxus::prelude::*;
use ui::{post_login_target, use_auth, use_services, AuthState};

/// Login page component. `redirect` is the guarded path that sent the user here.
#[component]
pub fn Login(redirect: String) -> Element {
    let services = use_services();
    let mut auth = use_auth();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    // If already signed in, continue to the requested page
    let return_to = redirect.clone();
    use_effect(move || {
        if let Some(target) = auth().resume_target(Some(&return_to)) {
            nav.replace(target);
        }
    });

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        let services = services.clone();
        let redirect = redirect.clone();
        spawn(async move {
            error.set(None);
            loading.set(true);
            match api::sign_in(&services.backend, &services.sessions, &email(), &password()).await {
                Ok(signed_in) => {
                    let target = post_login_target(Some(&redirect), signed_in.record.role);
                    auth.set(AuthState::signed_in(signed_in.record, Some(signed_in.profile)));
                    nav.replace(target);
                }
                Err(e) => {
                    loading.set(false);
                    error.set(Some(e.to_string()));
                }
            }
        });
    };

    rsx! {
        div {
            class: "auth-page",

            h1 { "Sign in" }

            form {
                onsubmit: handle_login,
                class: "auth-form",

                if let Some(err) = error() {
                    div {
                        class: "auth-error",
                        "{err}"
                    }
                }

                input {
                    r#type: "email",
                    placeholder: "Email",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                input {
                    r#type: "password",
                    placeholder: "Password",
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                button {
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Signing in..." } else { "Sign in" }
                }
            }

            p {
                "No account yet? "
                a { href: "/auth/register", "Create one" }
            }
        }
    }
}
