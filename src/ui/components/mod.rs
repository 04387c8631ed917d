// src/ui/components/mod.rs - Shared widgets

use dioxus::prelude::*;

use crate::ui::router::Route;
use crate::ui::state::use_ui;

/// Page title with optional subtitle and children below
#[component]
pub fn PageWrapper(
    #[props(default = "".to_string())] title: String,
    #[props(default = None)] subtitle: Option<String>,
    children: Element,
) -> Element {
    rsx! {
        div {
            class: "space-y-6",
            if !title.is_empty() {
                div {
                    h1 {
                        class: "text-2xl font-bold leading-7 text-gray-900 sm:text-3xl",
                        "{title}"
                    }
                    if let Some(subtitle) = subtitle {
                        p {
                            class: "mt-1 text-sm text-gray-500",
                            "{subtitle}"
                        }
                    }
                }
            }
            {children}
        }
    }
}

#[component]
pub fn ErrorBanner(message: Option<String>) -> Element {
    rsx! {
        if let Some(message) = message {
            div {
                class: "rounded-md bg-red-50 p-4 text-sm text-red-700",
                "{message}"
            }
        }
    }
}

#[component]
pub fn Notice(message: Option<String>) -> Element {
    rsx! {
        if let Some(message) = message {
            div {
                class: "rounded-md bg-green-50 p-4 text-sm text-green-700",
                "{message}"
            }
        }
    }
}

#[component]
pub fn Spinner() -> Element {
    rsx! {
        div {
            class: "flex justify-center py-6",
            div { class: "animate-spin rounded-full h-8 w-8 border-b-2 border-blue-600" }
        }
    }
}

/// Modal asking the user to confirm a destructive action
#[component]
pub fn ConfirmDialog(
    open: bool,
    title: String,
    message: String,
    #[props(default = "Подтвердить".to_string())] confirm_label: String,
    on_confirm: EventHandler<()>,
    on_cancel: EventHandler<()>,
) -> Element {
    if !open {
        return rsx! {};
    }

    rsx! {
        div {
            class: "fixed inset-0 z-50 flex items-center justify-center bg-black bg-opacity-40",
            div {
                class: "bg-white rounded-lg shadow-xl p-6 w-full max-w-md space-y-4",
                h3 { class: "text-lg font-medium text-gray-900", "{title}" }
                p { class: "text-sm text-gray-600", "{message}" }
                div {
                    class: "flex justify-end space-x-3",
                    button {
                        r#type: "button",
                        class: "px-4 py-2 text-sm rounded-md border border-gray-300 text-gray-700 hover:bg-gray-50",
                        onclick: move |_| on_cancel.call(()),
                        "Отмена"
                    }
                    button {
                        r#type: "button",
                        class: "px-4 py-2 text-sm rounded-md text-white bg-red-600 hover:bg-red-700",
                        onclick: move |_| on_confirm.call(()),
                        "{confirm_label}"
                    }
                }
            }
        }
    }
}

/// Draft badge. Counts adds still in flight.
#[component]
pub fn CartBadge() -> Element {
    let ui = use_ui();
    let cart = ui.cart.read().clone();
    let count = cart.displayed_count();

    let badge = rsx! {
        span {
            class: "inline-flex items-center px-3 py-1 rounded-full text-sm font-medium bg-blue-100 text-blue-800",
            "Заявка: {count}"
        }
    };

    match cart.bid_id {
        Some(id) if count > 0 => rsx! {
            Link { to: Route::BidEditor { id }, {badge} }
        },
        _ => badge,
    }
}
