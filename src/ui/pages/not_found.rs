// src/ui/pages/not_found.rs - 404 page

use dioxus::prelude::*;

use crate::ui::router::Route;

#[component]
pub fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");

    rsx! {
        div {
            class: "min-h-screen bg-white px-4 py-16 sm:px-6 sm:py-24 md:grid md:place-items-center lg:px-8",
            div {
                class: "max-w-max mx-auto sm:flex",
                p {
                    class: "text-4xl font-extrabold text-blue-600 sm:text-5xl",
                    "404"
                }
                div {
                    class: "sm:ml-6 sm:border-l sm:border-gray-200 sm:pl-6 space-y-4",
                    h1 {
                        class: "text-4xl font-extrabold text-gray-900 tracking-tight sm:text-5xl",
                        "Страница не найдена"
                    }
                    if !path.is_empty() {
                        p {
                            class: "text-sm text-gray-400 font-mono bg-gray-100 px-2 py-1 rounded",
                            "/{path}"
                        }
                    }
                    Link {
                        to: Route::Home {},
                        class: "inline-flex items-center px-4 py-2 text-sm font-medium rounded-md text-white bg-blue-600 hover:bg-blue-700",
                        "На главную"
                    }
                }
            }
        }
    }
}
