// src/ui/pages/catalog.rs - Component search and draft building

use dioxus::prelude::*;

use crate::api::Component;
use crate::app::AppStores;
use crate::store::{PowerRange, SearchFilters};
use crate::ui::components::{CartBadge, ErrorBanner, PageWrapper, Spinner};
use crate::ui::pages::{parse_decimal, INPUT, PRIMARY_BUTTON, SECONDARY_BUTTON};
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui, UiState};

async fn run_search(stores: AppStores, ui: UiState, query: String) {
    stores.search.set_search_value(query.clone()).await;
    stores.search.add_to_history(&query).await;
    if stores.catalog.fetch_components(&query).await.is_ok() {
        let search = stores.search.snapshot().await;
        stores.catalog.filter_with(&search).await;
    }
    ui.sync_search(&stores).await;
    ui.sync_catalog(&stores).await;
}

#[component]
pub fn Catalog() -> Element {
    let stores = use_stores();
    let ui = use_ui();

    let mut query = use_signal(|| ui.search.peek().search_value.clone());
    let mut min_power = use_signal(String::new);
    let mut max_power = use_signal(String::new);

    {
        let stores = stores.clone();
        use_future(move || {
            let stores = stores.clone();
            async move {
                let value = stores.search.snapshot().await.search_value;
                run_search(stores, ui, value).await;
            }
        });
    }

    let catalog = ui.catalog.read().clone();
    let search = ui.search.read().clone();
    let session = ui.session.read().clone();
    let subtitle = catalog
        .offline
        .then(|| "Сервер недоступен, показан демонстрационный каталог".to_string());

    let submit = {
        let stores = stores.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            spawn(run_search(stores.clone(), ui, query()));
        }
    };

    let apply_filters = {
        let stores = stores.clone();
        move |_| {
            let stores = stores.clone();
            let min = parse_decimal(&min_power());
            let max = parse_decimal(&max_power());
            spawn(async move {
                let power_range = (min.is_some() || max.is_some()).then_some(PowerRange { min, max });
                stores
                    .search
                    .set_filters(SearchFilters {
                        category: None,
                        power_range,
                    })
                    .await;
                if power_range.is_none() {
                    stores.search.clear_filters().await;
                }
                let search = stores.search.snapshot().await;
                stores.catalog.filter_with(&search).await;
                ui.sync_search(&stores).await;
                ui.sync_catalog(&stores).await;
            });
        }
    };

    let pick_history = {
        let stores = stores.clone();
        move |term: String| {
            query.set(term.clone());
            spawn(run_search(stores.clone(), ui, term));
        }
    };

    rsx! {
        PageWrapper {
            title: "Компоненты",
            subtitle: subtitle,

            div {
                class: "flex flex-wrap items-end gap-4",
                form {
                    class: "flex gap-2 flex-1",
                    onsubmit: submit,
                    input {
                        r#type: "search",
                        class: INPUT,
                        placeholder: "Название компонента",
                        value: "{query}",
                        oninput: move |e| query.set(e.value())
                    }
                    button { r#type: "submit", class: PRIMARY_BUTTON, "Найти" }
                }
                div {
                    class: "flex gap-2 items-end",
                    input {
                        class: "{INPUT} w-28",
                        placeholder: "Мощность от",
                        value: "{min_power}",
                        oninput: move |e| min_power.set(e.value())
                    }
                    input {
                        class: "{INPUT} w-28",
                        placeholder: "до",
                        value: "{max_power}",
                        oninput: move |e| max_power.set(e.value())
                    }
                    button { r#type: "button", class: SECONDARY_BUTTON, onclick: apply_filters, "Фильтр" }
                }
                if session.is_authenticated() {
                    CartBadge {}
                }
            }

            if !search.previous_searches.is_empty() {
                div {
                    class: "flex flex-wrap gap-2 text-sm",
                    span { class: "text-gray-500", "Недавние:" }
                    for term in search.previous_searches.clone() {
                        button {
                            key: "{term}",
                            r#type: "button",
                            class: "px-2 py-1 rounded bg-gray-100 hover:bg-gray-200 text-gray-700",
                            onclick: {
                                let mut pick_history = pick_history.clone();
                                let term = term.clone();
                                move |_| pick_history(term.clone())
                            },
                            "{term}"
                        }
                    }
                }
            }

            ErrorBanner { message: catalog.error.clone() }

            if catalog.loading {
                Spinner {}
            } else if catalog.filtered.is_empty() {
                p { class: "text-gray-500 py-12 text-center", "Ничего не найдено" }
            } else {
                div {
                    class: "grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6",
                    for component in catalog.filtered.clone() {
                        ComponentCard {
                            key: "{component.id}",
                            component: component.clone(),
                            can_add: session.is_authenticated(),
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn ComponentCard(component: Component, can_add: bool) -> Element {
    let stores = use_stores();
    let mut ui = use_ui();

    let image = component.image.as_deref().map(|path| stores.client.resolve(path));
    let component_id = component.id;

    let add = move |_| {
        let stores = stores.clone();
        ui.cart.with_mut(|cart| cart.pending_adds += 1);
        spawn(async move {
            if let Err(e) = stores.cart.add_item(component_id).await {
                tracing::warn!(component_id, "add to draft failed: {}", e);
            }
            ui.sync_cart(&stores).await;
        });
    };

    rsx! {
        div {
            class: "bg-white rounded-lg shadow p-6 flex flex-col space-y-3",
            if let Some(src) = image {
                img { class: "h-40 w-full object-contain", src: "{src}", alt: "{component.title}" }
            } else {
                div { class: "h-40 w-full flex items-center justify-center bg-gray-100 text-gray-400", "Нет изображения" }
            }
            Link {
                to: Route::ComponentDetail { id: component.id },
                class: "text-lg font-medium text-gray-900 hover:text-blue-600",
                "{component.title}"
            }
            p { class: "text-sm text-gray-600", "Мощность: {component.power} кВт" }
            p { class: "text-sm text-gray-600", "Коэффициент мощности: {component.coeff}" }
            if can_add {
                button { r#type: "button", class: PRIMARY_BUTTON, onclick: add, "Добавить" }
            }
        }
    }
}
