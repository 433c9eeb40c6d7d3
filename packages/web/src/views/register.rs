//! Registration page view with email/password form.

use api::SignUp;
use dioxus::prelude::*;
use store::Role;
use ui::{dashboard_path, use_auth, use_services, AuthState};

/// Register page component. Customers and providers can sign themselves up.
#[component]
pub fn Register() -> Element {
    let services = use_services();
    let mut auth = use_auth();
    let nav = use_navigator();
    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm_password = use_signal(String::new);
    let mut role = use_signal(|| Role::Customer);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let handle_register = move |evt: FormEvent| {
        evt.prevent_default();
        let services = services.clone();
        spawn(async move {
            error.set(None);

            if password() != confirm_password() {
                error.set(Some("Passwords do not match".to_string()));
                return;
            }

            loading.set(true);
            let account = SignUp {
                email: email(),
                password: password(),
                display_name: name(),
                role: role(),
            };
            match api::sign_up(&services.backend, &services.sessions, account).await {
                Ok(signed_in) => {
                    let target = dashboard_path(signed_in.record.role);
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

            h1 { "Create account" }

            form {
                onsubmit: handle_register,
                class: "auth-form",

                if let Some(err) = error() {
                    div {
                        class: "auth-error",
                        "{err}"
                    }
                }

                input {
                    r#type: "text",
                    placeholder: "Name",
                    value: name(),
                    oninput: move |evt: FormEvent| name.set(evt.value()),
                }

                input {
                    r#type: "email",
                    placeholder: "Email",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                input {
                    r#type: "password",
                    placeholder: "Password (min 8 characters)",
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                input {
                    r#type: "password",
                    placeholder: "Confirm password",
                    value: confirm_password(),
                    oninput: move |evt: FormEvent| confirm_password.set(evt.value()),
                }

                select {
                    value: role().as_str(),
                    onchange: move |evt: FormEvent| {
                        if let Ok(picked) = evt.value().parse::<Role>() {
                            role.set(picked);
                        }
                    },
                    option { value: "customer", "I want to book services" }
                    option { value: "provider", "I offer services" }
                }

                button {
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Creating account..." } else { "Sign up" }
                }
            }

            p {
                "Already have an account? "
                a { href: "/auth", "Sign in" }
            }
        }
    }
}
