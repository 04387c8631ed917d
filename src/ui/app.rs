// src/ui/app.rs - Root component: store injection and routing

use dioxus::prelude::*;

use crate::app::{AppStores, ApplicationCore};
use crate::config::AppConfig;
use crate::ui::router::Route;
use crate::ui::state::{use_stores, UiState};

/// Uses the stores handed over by the launcher, or builds a default set
/// when launched without them (web).
#[component]
pub fn App() -> Element {
    let ready = use_hook(|| {
        if try_consume_context::<AppStores>().is_some() {
            return true;
        }
        match ApplicationCore::new(AppConfig::default()) {
            Ok(core) => {
                provide_context(core.stores());
                true
            }
            Err(e) => {
                tracing::error!("failed to build application core: {}", e);
                false
            }
        }
    });

    if !ready {
        return rsx! {
            div {
                class: "min-h-screen flex items-center justify-center text-red-700",
                "Не удалось запустить приложение"
            }
        };
    }

    rsx! { Shell {} }
}

#[component]
fn Shell() -> Element {
    let stores = use_stores();
    let ui = use_context_provider(UiState::new);

    use_future(move || {
        let stores = stores.clone();
        async move {
            stores.bootstrap().await;
            ui.sync_all(&stores).await;
        }
    });

    rsx! {
        Router::<Route> {}
    }
}
