// src/ui/pages/bids.rs - Bid listing with live refresh and moderation

use chrono::NaiveDate;
use dioxus::prelude::*;

use crate::api::{Bid, StatusKind};
use crate::store::BidQuery;
use crate::ui::components::{ErrorBanner, PageWrapper};
use crate::ui::pages::INPUT;
use crate::ui::router::Route;
use crate::ui::state::{self, use_stores, use_ui};
use crate::utils::Time;

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[component]
pub fn Bids() -> Element {
    let stores = use_stores();
    let ui = use_ui();

    let creator = use_signal(String::new);
    let status = use_signal(String::new);
    let start_date = use_signal(String::new);
    let end_date = use_signal(String::new);

    // Dropped with the page, which ends the loop.
    {
        let stores = stores.clone();
        use_future(move || {
            let stores = stores.clone();
            async move {
                let interval = stores.poll_interval();
                loop {
                    let query = BidQuery {
                        creator: non_empty(creator.peek().clone()),
                        status: non_empty(status.peek().clone()),
                        start_date: parse_day(&start_date.peek()),
                        end_date: parse_day(&end_date.peek()),
                    };
                    if let Err(e) = stores.bids.fetch_bids(&query).await {
                        tracing::debug!("bid refresh failed: {}", e);
                    }
                    ui.sync_bids(&stores).await;
                    state::sleep(interval).await;
                }
            }
        });
    }

    let session = ui.session.read().clone();
    let bids = ui.bids.read().clone();

    if !session.is_authenticated() {
        return rsx! {
            PageWrapper {
                title: "Заявки",
                p {
                    class: "text-gray-600",
                    Link { to: Route::Login {}, class: "text-blue-600", "Войдите" }
                    ", чтобы увидеть заявки."
                }
            }
        };
    }

    let moderator = session.is_moderator();
    let title = if moderator { "Все заявки" } else { "Мои заявки" };

    rsx! {
        PageWrapper {
            title: "{title}",

            div {
                class: "bg-white rounded-lg shadow p-4 grid grid-cols-1 md:grid-cols-4 gap-4",
                if moderator {
                    FilterInput { label: "Создатель", value: creator, kind: "text" }
                }
                div {
                    label { class: "block text-xs text-gray-500", "Статус" }
                    select {
                        class: INPUT,
                        value: "{status}",
                        onchange: {
                            let mut status = status;
                            move |e: FormEvent| status.set(e.value())
                        },
                        option { value: "", "Любой" }
                        for kind in StatusKind::ALL {
                            option { key: "{kind.tag()}", value: kind.tag(), "{kind.tag()}" }
                        }
                    }
                }
                FilterInput { label: "С даты", value: start_date, kind: "date" }
                FilterInput { label: "По дату", value: end_date, kind: "date" }
            }

            ErrorBanner { message: bids.error.clone() }

            if bids.items.is_empty() {
                p { class: "text-gray-500 py-12 text-center", "Заявок нет" }
            } else {
                table {
                    class: "min-w-full divide-y divide-gray-200 bg-white rounded-lg shadow",
                    thead {
                        tr {
                            th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "№" }
                            th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Статус" }
                            th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Создатель" }
                            th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Обновлена" }
                            th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Мощность, кВт" }
                            if moderator {
                                th { class: "px-4 py-2 text-left text-xs font-medium text-gray-500", "Действия" }
                            }
                        }
                    }
                    tbody {
                        for bid in bids.items.clone() {
                            BidRow {
                                key: "{bid.id}",
                                bid: bid.clone(),
                                moderator,
                                moderator_id: session.user_id(),
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn FilterInput(label: String, value: Signal<String>, kind: String) -> Element {
    let mut value = value;
    rsx! {
        div {
            label { class: "block text-xs text-gray-500", "{label}" }
            input {
                class: INPUT,
                r#type: "{kind}",
                value: "{value}",
                oninput: move |e| value.set(e.value())
            }
        }
    }
}

#[component]
fn BidRow(bid: Bid, moderator: bool, moderator_id: Option<i64>) -> Element {
    let stores = use_stores();
    let ui = use_ui();
    let navigator = use_navigator();

    let bid_id = bid.id;
    let target = Route::for_bid(bid_id, bid.status.is_draft(), moderator);
    let updated = bid.updated_at().map(|d| Time::format_date(&d)).unwrap_or_else(|| "—".to_string());
    let power = bid
        .calculated_power_count
        .map(|p| format!("{:.2}", p))
        .unwrap_or_else(|| "—".to_string());
    let can_moderate = moderator && bid.status.is(StatusKind::Formed);

    let decide = move |new_status: StatusKind| {
        let stores = stores.clone();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            let Some(moderator_id) = moderator_id else {
                return;
            };
            let stores = stores.clone();
            spawn(async move {
                if let Err(e) = stores.bids.update_status(bid_id, new_status.tag(), moderator_id).await {
                    tracing::warn!(bid_id, "moderation failed: {}", e);
                }
                ui.sync_bids(&stores).await;
            });
        }
    };

    rsx! {
        tr {
            class: "hover:bg-gray-50 cursor-pointer",
            onclick: move |_| {
                navigator.push(target.clone());
            },
            td { class: "px-4 py-2", "{bid.id}" }
            td { class: "px-4 py-2", "{bid.status}" }
            td { class: "px-4 py-2", "{bid.creator_login}" }
            td { class: "px-4 py-2", "{updated}" }
            td { class: "px-4 py-2", "{power}" }
            if moderator {
                td {
                    class: "px-4 py-2 space-x-2",
                    if can_moderate && moderator_id.is_some() {
                        button {
                            r#type: "button",
                            class: "px-2 py-1 text-xs rounded bg-green-600 text-white",
                            onclick: decide(StatusKind::Completed),
                            "Завершить"
                        }
                        button {
                            r#type: "button",
                            class: "px-2 py-1 text-xs rounded bg-red-600 text-white",
                            onclick: decide(StatusKind::Rejected),
                            "Отклонить"
                        }
                    } else {
                        span { class: "text-gray-400", "—" }
                    }
                }
            }
        }
    }
}
