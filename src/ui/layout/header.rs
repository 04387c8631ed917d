// src/ui/layout/header.rs - Navigation, draft badge and session controls

use dioxus::prelude::*;

use crate::ui::components::CartBadge;
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui};

const NAV_LINK: &str = "px-3 py-2 rounded-md text-sm font-medium text-gray-700 hover:text-gray-900 hover:bg-gray-100";

#[component]
pub fn Header() -> Element {
    let stores = use_stores();
    let ui = use_ui();
    let navigator = use_navigator();

    let session = ui.session.read().clone();
    let username = session.username().unwrap_or_default().to_string();
    let authenticated = session.is_authenticated();
    let moderator = session.is_moderator();

    let logout = move |_| {
        let stores = stores.clone();
        spawn(async move {
            if let Err(e) = stores.session.logout().await {
                tracing::warn!("logout reported an error: {}", e);
            }
            ui.sync_all(&stores).await;
            navigator.push(Route::Catalog {});
        });
    };

    rsx! {
        header {
            class: "bg-white shadow-sm border-b border-gray-200",
            div {
                class: "max-w-7xl mx-auto px-4 sm:px-6 lg:px-8 h-16 flex items-center justify-between",

                div {
                    class: "flex items-center space-x-4",
                    Link {
                        to: Route::Home {},
                        class: "text-xl font-bold text-gray-900",
                        "Расчёт ИБП"
                    }
                    Link { to: Route::Catalog {}, class: NAV_LINK, "Компоненты" }
                    if authenticated {
                        Link {
                            to: Route::Bids {},
                            class: NAV_LINK,
                            if moderator { "Все заявки" } else { "Мои заявки" }
                        }
                    }
                }

                div {
                    class: "flex items-center space-x-4",
                    if authenticated {
                        CartBadge {}
                        Link { to: Route::Profile {}, class: NAV_LINK, "{username}" }
                        button {
                            r#type: "button",
                            class: "px-3 py-2 rounded-md text-sm font-medium text-red-600 hover:bg-red-50",
                            onclick: logout,
                            "Выйти"
                        }
                    } else {
                        Link { to: Route::Login {}, class: NAV_LINK, "Войти" }
                        Link { to: Route::Register {}, class: NAV_LINK, "Регистрация" }
                    }
                }
            }
        }
    }
}
