// src/ui/pages/bid_details.rs - Read-only bid view

use dioxus::prelude::*;

use crate::ui::components::{ErrorBanner, PageWrapper, Spinner};
use crate::ui::pages::SECONDARY_BUTTON;
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui};
use crate::utils::Time;

#[component]
pub fn BidDetails(id: i64) -> Element {
    let stores = use_stores();
    let ui = use_ui();

    use_effect(use_reactive((&id,), move |(id,)| {
        let stores = stores.clone();
        spawn(async move {
            stores.cart.clear_error().await;
            if let Err(e) = stores.cart.load_bid(id).await {
                tracing::warn!(bid_id = id, "bid detail failed: {}", e);
            }
            ui.sync_cart(&stores).await;
        });
    }));

    let cart = ui.cart.read().clone();
    let Some(bid) = cart.detail.clone().filter(|bid| bid.id == id) else {
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

    let total = format!("{:.2}", bid.total_calculated_power());
    let updated = bid.updated_at().map(|d| Time::format_date(&d)).unwrap_or_else(|| "—".to_string());
    let finished = bid.finished_at().map(|d| Time::format_date(&d));
    let incoming = bid.incoming_current.map(|v| format!("{} А", v)).unwrap_or_else(|| "не указан".to_string());

    rsx! {
        PageWrapper {
            title: "Заявка №{bid.id}",
            subtitle: Some(format!("Статус: {}", bid.status)),

            dl {
                class: "bg-white rounded-lg shadow p-6 grid grid-cols-2 md:grid-cols-4 gap-4 text-sm",
                div { dt { class: "text-gray-500", "Создатель" } dd { "{bid.creator_login}" } }
                div { dt { class: "text-gray-500", "Обновлена" } dd { "{updated}" } }
                if let Some(finished) = finished {
                    div { dt { class: "text-gray-500", "Завершена" } dd { "{finished}" } }
                }
                if let Some(moderator) = bid.moderator_login.clone() {
                    div { dt { class: "text-gray-500", "Модератор" } dd { "{moderator}" } }
                }
                div { dt { class: "text-gray-500", "Входной ток" } dd { "{incoming}" } }
                div { dt { class: "text-gray-500", "Итоговая мощность" } dd { class: "font-semibold", "{total} кВт" } }
            }

            table {
                class: "min-w-full divide-y divide-gray-200 bg-white rounded-lg shadow",
                thead {
                    tr {
                        th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Компонент" }
                        th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Количество" }
                        th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Время работы, ч" }
                        th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Мощность, кВт" }
                    }
                }
                tbody {
                    for line in bid.components.clone() {
                        tr {
                            key: "{line.id}",
                            td { class: "px-4 py-2", "{line.title}" }
                            td { class: "px-4 py-2", "{line.count}" }
                            td { class: "px-4 py-2", "{line.battery_life}" }
                            td { class: "px-4 py-2", "{line.calculated_power}" }
                        }
                    }
                }
            }

            Link { to: Route::Bids {}, class: SECONDARY_BUTTON, "К списку заявок" }
        }
    }
}
