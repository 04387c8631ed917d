// src/ui/layout/mod.rs - Page chrome

use dioxus::prelude::*;

mod header;

pub use header::Header;

use crate::ui::router::Route;

/// Header above the routed page
#[component]
pub fn Layout() -> Element {
    rsx! {
        div {
            class: "min-h-screen bg-gray-50",
            Header {}
            main {
                class: "max-w-7xl mx-auto py-6 px-4 sm:px-6 lg:px-8",
                Outlet::<Route> {}
            }
        }
    }
}
