// src/ui/pages/profile.rs - Login and password change

use dioxus::prelude::*;

use crate::auth::ProfileUpdate;
use crate::ui::components::{ErrorBanner, Notice, PageWrapper};
use crate::ui::pages::{INPUT, PRIMARY_BUTTON};
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui};

#[component]
pub fn Profile() -> Element {
    let stores = use_stores();
    let ui = use_ui();

    let session = ui.session.read().clone();
    let current_login = session.username().unwrap_or_default().to_string();

    let mut new_login = use_signal(|| current_login.clone());
    let mut new_password = use_signal(String::new);
    let mut current_password = use_signal(String::new);
    let mut form_error = use_signal(|| None::<String>);

    let Some(user_id) = session.user_id() else {
        return rsx! {
            PageWrapper {
                title: "Профиль",
                if session.is_authenticated() {
                    ErrorBanner { message: Some("Идентификатор пользователя недоступен".to_string()) }
                } else {
                    p {
                        class: "text-gray-600",
                        Link { to: Route::Login {}, class: "text-blue-600", "Войдите" }
                        ", чтобы изменить профиль."
                    }
                }
            }
        };
    };

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        form_error.set(None);

        if current_password().is_empty() {
            form_error.set(Some("Введите текущий пароль".to_string()));
            return;
        }

        let update = ProfileUpdate {
            user_id,
            new_login: Some(new_login()),
            new_password: Some(new_password()).filter(|p| !p.is_empty()),
            current_password: current_password(),
        };
        let stores = stores.clone();
        spawn(async move {
            if stores.session.update_profile(update).await.is_ok() {
                new_password.set(String::new());
                current_password.set(String::new());
            }
            ui.sync_session(&stores).await;
        });
    };

    rsx! {
        PageWrapper {
            title: "Профиль",
            subtitle: Some(format!("Пользователь: {}", current_login)),
            form {
                class: "max-w-md space-y-6 bg-white p-6 rounded-lg shadow",
                onsubmit: handle_submit,

                ErrorBanner { message: form_error().or(session.error.clone()) }
                Notice { message: session.message.clone() }

                div {
                    label { class: "block text-sm font-medium text-gray-700", "Логин" }
                    input {
                        r#type: "text",
                        class: INPUT,
                        value: "{new_login}",
                        oninput: move |e| new_login.set(e.value())
                    }
                }
                div {
                    label { class: "block text-sm font-medium text-gray-700", "Новый пароль" }
                    input {
                        r#type: "password",
                        class: INPUT,
                        placeholder: "Оставьте пустым, чтобы не менять",
                        value: "{new_password}",
                        oninput: move |e| new_password.set(e.value())
                    }
                }
                div {
                    label { class: "block text-sm font-medium text-gray-700", "Текущий пароль" }
                    input {
                        r#type: "password",
                        class: INPUT,
                        value: "{current_password}",
                        oninput: move |e| current_password.set(e.value())
                    }
                }
                button {
                    r#type: "submit",
                    class: PRIMARY_BUTTON,
                    disabled: session.loading,
                    "Сохранить"
                }
            }
        }
    }
}
