// src/ui/pages/bid_editor.rs - Draft editing, submission and clearing

use dioxus::prelude::*;

use crate::api::CartLine;
use crate::app::AppStores;
use crate::ui::components::{ConfirmDialog, ErrorBanner, Notice, PageWrapper, Spinner};
use crate::ui::pages::{parse_decimal, DANGER_BUTTON, INPUT, PRIMARY_BUTTON, SECONDARY_BUTTON};
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui, UiState};

async fn reload(stores: &AppStores, ui: UiState, bid_id: i64) {
    if let Err(e) = stores.cart.load_bid(bid_id).await {
        tracing::warn!(bid_id, "draft reload failed: {}", e);
    }
    ui.sync_cart(stores).await;
}

#[component]
pub fn BidEditor(id: i64) -> Element {
    let stores = use_stores();
    let ui = use_ui();
    let navigator = use_navigator();

    let mut incoming_current = use_signal(String::new);
    let mut confirm_clear = use_signal(|| false);
    let mut form_error = use_signal(|| None::<String>);

    {
        let stores = stores.clone();
        use_effect(use_reactive((&id,), move |(id,)| {
            let stores = stores.clone();
            spawn(async move {
                stores.cart.clear_error().await;
                reload(&stores, ui, id).await;
                let current = stores
                    .cart
                    .snapshot()
                    .await
                    .detail
                    .and_then(|bid| bid.incoming_current);
                if let Some(value) = current {
                    incoming_current.set(value.to_string());
                }
            });
        }));
    }

    let cart = ui.cart.read().clone();
    let detail = cart.detail.clone().filter(|bid| bid.id == id);

    let submit = {
        let stores = stores.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            form_error.set(None);
            let Some(value) = parse_decimal(&incoming_current()) else {
                form_error.set(Some("Введите входной ток числом".to_string()));
                return;
            };
            let stores = stores.clone();
            spawn(async move {
                match stores.cart.submit(id, value).await {
                    Ok(_) => reload(&stores, ui, id).await,
                    Err(e) => {
                        tracing::warn!(bid_id = id, "submit failed: {}", e);
                        ui.sync_cart(&stores).await;
                    }
                }
            });
        }
    };

    let clear_all = {
        let stores = stores.clone();
        move |_| {
            confirm_clear.set(false);
            let stores = stores.clone();
            spawn(async move {
                let cleared = stores.cart.clear_bid(id).await;
                ui.sync_cart(&stores).await;
                if cleared.is_ok() {
                    navigator.push(Route::Catalog {});
                }
            });
        }
    };

    let Some(bid) = detail else {
        return rsx! {
            PageWrapper {
                title: "Заявка №{id}",
                if cart.loading {
                    Spinner {}
                } else {
                    ErrorBanner { message: cart.error.clone().or(Some("Заявка не найдена".to_string())) }
                }
            }
        };
    };

    let result_notice = cart
        .calculation_result
        .map(|power| format!("Рассчитанная мощность ИБП: {:.2} кВт", power));

    rsx! {
        PageWrapper {
            title: "Заявка №{bid.id}",
            subtitle: Some(format!("Статус: {}", bid.status)),

            ErrorBanner { message: form_error().or(cart.error.clone()) }
            Notice { message: result_notice }

            if bid.components.is_empty() {
                p { class: "text-gray-500", "В заявке нет компонентов" }
            }

            div {
                class: "space-y-4",
                for line in bid.components.clone() {
                    LineEditor { key: "{line.id}", bid_id: bid.id, line: line.clone() }
                }
            }

            form {
                class: "bg-white rounded-lg shadow p-6 flex flex-wrap items-end gap-4",
                onsubmit: submit,
                div {
                    class: "flex-1",
                    label { class: "block text-sm font-medium text-gray-700", "Входной ток, А" }
                    input {
                        class: INPUT,
                        value: "{incoming_current}",
                        oninput: move |e| incoming_current.set(e.value())
                    }
                }
                button {
                    r#type: "submit",
                    class: PRIMARY_BUTTON,
                    disabled: cart.loading,
                    "Сохранить и рассчитать"
                }
                button {
                    r#type: "button",
                    class: DANGER_BUTTON,
                    onclick: move |_| confirm_clear.set(true),
                    "Очистить заявку"
                }
                Link { to: Route::Catalog {}, class: SECONDARY_BUTTON, "К компонентам" }
            }

            ConfirmDialog {
                open: confirm_clear(),
                title: "Очистить заявку?",
                message: "Все компоненты будут удалены, а сама заявка закрыта.",
                confirm_label: "Очистить",
                on_confirm: clear_all,
                on_cancel: move |_| confirm_clear.set(false),
            }
        }
    }
}

#[component]
fn LineEditor(bid_id: i64, line: CartLine) -> Element {
    let stores = use_stores();
    let ui = use_ui();

    let mut count = use_signal(|| line.count.to_string());
    let mut battery_life = use_signal(|| line.battery_life.to_string());
    let mut line_error = use_signal(|| None::<String>);
    let mut confirm_remove = use_signal(|| false);
    let line_id = line.id;
    let calculated = format!("{:.2}", line.calculated_power);

    let save = {
        let stores = stores.clone();
        move |_| {
            line_error.set(None);
            let parsed_count = count().trim().parse::<u32>().ok().filter(|c| *c > 0);
            let (Some(new_count), Some(hours)) = (parsed_count, parse_decimal(&battery_life())) else {
                line_error.set(Some("Количество и время работы должны быть числами".to_string()));
                return;
            };
            let stores = stores.clone();
            spawn(async move {
                if let Err(e) = stores.cart.save_component_line(line_id, new_count, hours).await {
                    tracing::warn!(line_id, "line save failed: {}", e);
                }
                ui.sync_cart(&stores).await;
            });
        }
    };

    let remove = {
        let stores = stores.clone();
        move |_| {
            confirm_remove.set(false);
            let stores = stores.clone();
            spawn(async move {
                if let Err(e) = stores.cart.remove_item(bid_id, line_id).await {
                    tracing::warn!(line_id, "line removal failed: {}", e);
                }
                reload(&stores, ui, bid_id).await;
            });
        }
    };

    rsx! {
        div {
            class: "bg-white rounded-lg shadow p-4 flex flex-wrap items-end gap-4",
            div {
                class: "flex-1 min-w-[12rem]",
                p { class: "font-medium text-gray-900", "{line.title}" }
                p { class: "text-sm text-gray-500", "Мощность: {line.power} кВт, коэффициент: {line.coeff}" }
                if line.calculated_power > 0.0 {
                    p { class: "text-sm text-gray-700", "Рассчитано: {calculated} кВт" }
                }
                ErrorBanner { message: line_error() }
            }
            div {
                label { class: "block text-xs text-gray-500", "Количество" }
                input {
                    class: "{INPUT} w-24",
                    r#type: "number",
                    min: "1",
                    value: "{count}",
                    oninput: move |e| count.set(e.value())
                }
            }
            div {
                label { class: "block text-xs text-gray-500", "Время работы, ч" }
                input {
                    class: "{INPUT} w-28",
                    value: "{battery_life}",
                    oninput: move |e| battery_life.set(e.value())
                }
            }
            button { r#type: "button", class: SECONDARY_BUTTON, onclick: save, "Сохранить" }
            button {
                r#type: "button",
                class: DANGER_BUTTON,
                onclick: move |_| confirm_remove.set(true),
                "Удалить"
            }
            ConfirmDialog {
                open: confirm_remove(),
                title: "Удалить компонент?",
                message: "«{line.title}» будет удалён из заявки.",
                confirm_label: "Удалить",
                on_confirm: remove,
                on_cancel: move |_| confirm_remove.set(false),
            }
        }
    }
}
