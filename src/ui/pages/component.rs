// src/ui/pages/component.rs - Single component view

use dioxus::prelude::*;

use crate::ui::components::{ErrorBanner, PageWrapper, Spinner};
use crate::ui::pages::{PRIMARY_BUTTON, SECONDARY_BUTTON};
use crate::ui::router::Route;
use crate::ui::state::{use_stores, use_ui};

#[component]
pub fn ComponentDetail(id: i64) -> Element {
    let stores = use_stores();
    let mut ui = use_ui();

    {
        let stores = stores.clone();
        use_effect(use_reactive((&id,), move |(id,)| {
            let stores = stores.clone();
            spawn(async move {
                if let Err(e) = stores.catalog.fetch_component(id).await {
                    tracing::warn!(component_id = id, "component detail failed: {}", e);
                }
                ui.sync_catalog(&stores).await;
            });
        }));
    }

    let catalog = ui.catalog.read().clone();
    let authenticated = ui.session.read().is_authenticated();
    let selected = catalog.selected.clone().filter(|c| c.id == id);
    let image = selected
        .as_ref()
        .and_then(|c| c.image.as_deref())
        .map(|path| stores.client.resolve(path));

    let add = move |_| {
        let stores = stores.clone();
        ui.cart.with_mut(|cart| cart.pending_adds += 1);
        spawn(async move {
            if let Err(e) = stores.cart.add_item(id).await {
                tracing::warn!(component_id = id, "add to draft failed: {}", e);
            }
            ui.sync_cart(&stores).await;
        });
    };

    let Some(component) = selected else {
        return rsx! {
            PageWrapper {
                title: "Компонент",
                if catalog.loading {
                    Spinner {}
                } else {
                    ErrorBanner { message: catalog.error.clone().or(Some("Компонент не найден".to_string())) }
                }
                Link { to: Route::Catalog {}, class: SECONDARY_BUTTON, "К списку" }
            }
        };
    };

    rsx! {
        PageWrapper {
            title: component.title.clone(),
            div {
                class: "bg-white rounded-lg shadow p-6 grid grid-cols-1 md:grid-cols-2 gap-6",
                if let Some(src) = image {
                    img { class: "w-full object-contain max-h-96", src: "{src}", alt: "{component.title}" }
                }
                dl {
                    class: "space-y-3",
                    div {
                        dt { class: "text-sm text-gray-500", "Мощность" }
                        dd { class: "text-lg text-gray-900", "{component.power} кВт" }
                    }
                    div {
                        dt { class: "text-sm text-gray-500", "Коэффициент мощности" }
                        dd { class: "text-lg text-gray-900", "{component.coeff}" }
                    }
                }
            }
            div {
                class: "flex gap-3",
                Link { to: Route::Catalog {}, class: SECONDARY_BUTTON, "К списку" }
                if authenticated {
                    button { r#type: "button", class: PRIMARY_BUTTON, onclick: add, "Добавить в заявку" }
                }
            }
        }
    }
}
