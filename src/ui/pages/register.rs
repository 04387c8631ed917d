// src/ui/pages/register.rs - Account creation

use dioxus::prelude::*;

use crate::ui::components::{ErrorBanner, Notice};
use crate::ui::pages::{INPUT, PRIMARY_BUTTON};
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui};

#[component]
pub fn Register() -> Element {
    let stores = use_stores();
    let ui = use_ui();

    let mut username = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm = use_signal(String::new);
    let mut form_error = use_signal(|| None::<String>);
    let mut registered = use_signal(|| false);

    let session = ui.session.read().clone();

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        form_error.set(None);

        if username().trim().is_empty() || password().is_empty() {
            form_error.set(Some("Введите логин и пароль".to_string()));
            return;
        }
        if password() != confirm() {
            form_error.set(Some("Пароли не совпадают".to_string()));
            return;
        }

        let stores = stores.clone();
        let login = username().trim().to_string();
        let secret = password();
        spawn(async move {
            let result = stores.session.register(&login, &secret).await;
            registered.set(result.is_ok());
            ui.sync_session(&stores).await;
        });
    };

    let notice = if registered() {
        Some(
            session
                .message
                .clone()
                .unwrap_or_else(|| "Регистрация прошла успешно".to_string()),
        )
    } else {
        None
    };

    rsx! {
        div {
            class: "flex items-center justify-center py-12",
            div {
                class: "max-w-md w-full space-y-8",
                h2 {
                    class: "text-center text-3xl font-extrabold text-gray-900",
                    "Регистрация"
                }
                form {
                    class: "space-y-6",
                    onsubmit: handle_submit,

                    ErrorBanner { message: form_error().or(session.error.clone()) }
                    Notice { message: notice }

                    div {
                        label { class: "block text-sm font-medium text-gray-700", "Логин" }
                        input {
                            r#type: "text",
                            class: INPUT,
                            value: "{username}",
                            oninput: move |e| username.set(e.value())
                        }
                    }
                    div {
                        label { class: "block text-sm font-medium text-gray-700", "Пароль" }
                        input {
                            r#type: "password",
                            class: INPUT,
                            value: "{password}",
                            oninput: move |e| password.set(e.value())
                        }
                    }
                    div {
                        label { class: "block text-sm font-medium text-gray-700", "Повторите пароль" }
                        input {
                            r#type: "password",
                            class: INPUT,
                            value: "{confirm}",
                            oninput: move |e| confirm.set(e.value())
                        }
                    }
                    button {
                        r#type: "submit",
                        class: "{PRIMARY_BUTTON} w-full",
                        disabled: session.loading,
                        "Зарегистрироваться"
                    }
                }
                p {
                    class: "text-center text-sm text-gray-600",
                    "Уже есть аккаунт? "
                    Link { to: Route::Login {}, class: "text-blue-600 hover:text-blue-500", "Войти" }
                }
            }
        }
    }
}
