// src/ui/pages/login.rs - Sign-in form

use dioxus::prelude::*;

use crate::api::LoginRequest;
use crate::ui::components::ErrorBanner;
use crate::ui::pages::{INPUT, PRIMARY_BUTTON};
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui};

#[component]
pub fn Login() -> Element {
    let stores = use_stores();
    let ui = use_ui();
    let navigator = use_navigator();

    let mut username = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut form_error = use_signal(|| None::<String>);

    let session = ui.session.read().clone();

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        form_error.set(None);

        if username().trim().is_empty() || password().is_empty() {
            form_error.set(Some("Введите логин и пароль".to_string()));
            return;
        }

        let stores = stores.clone();
        let request = LoginRequest::new(username().trim(), password());
        spawn(async move {
            let result = stores.session.login(request).await;
            ui.sync_session(&stores).await;
            if result.is_ok() {
                if let Err(e) = stores.cart.fetch_cart().await {
                    tracing::debug!("no draft after login: {}", e);
                }
                ui.sync_cart(&stores).await;
                navigator.push(Route::Catalog {});
            }
        });
    };

    rsx! {
        div {
            class: "flex items-center justify-center py-12",
            div {
                class: "max-w-md w-full space-y-8",
                h2 {
                    class: "text-center text-3xl font-extrabold text-gray-900",
                    "Вход"
                }
                form {
                    class: "space-y-6",
                    onsubmit: handle_submit,

                    ErrorBanner { message: form_error().or(session.error.clone()) }

                    div {
                        label { r#for: "username", class: "block text-sm font-medium text-gray-700", "Логин" }
                        input {
                            id: "username",
                            r#type: "text",
                            autocomplete: "username",
                            class: INPUT,
                            value: "{username}",
                            oninput: move |e| username.set(e.value())
                        }
                    }
                    div {
                        label { r#for: "password", class: "block text-sm font-medium text-gray-700", "Пароль" }
                        input {
                            id: "password",
                            r#type: "password",
                            autocomplete: "current-password",
                            class: INPUT,
                            value: "{password}",
                            oninput: move |e| password.set(e.value())
                        }
                    }
                    button {
                        r#type: "submit",
                        class: "{PRIMARY_BUTTON} w-full",
                        disabled: session.loading,
                        if session.loading { "Вход..." } else { "Войти" }
                    }
                }
                p {
                    class: "text-center text-sm text-gray-600",
                    "Нет аккаунта? "
                    Link { to: Route::Register {}, class: "text-blue-600 hover:text-blue-500", "Зарегистрироваться" }
                }
            }
        }
    }
}
