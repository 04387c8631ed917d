// src/ui/pages/home.rs

use dioxus::prelude::*;

use crate::ui::pages::PRIMARY_BUTTON;
use crate::ui::router::Route;

#[component]
pub fn Home() -> Element {
    rsx! {
        div {
            class: "text-center py-16 space-y-6",
            h1 {
                class: "text-4xl font-extrabold text-gray-900",
                "Расчёт источника бесперебойного питания"
            }
            p {
                class: "text-lg text-gray-600 max-w-2xl mx-auto",
                "Соберите заявку из оборудования, укажите время автономной работы и входной ток, и сервер рассчитает требуемую мощность ИБП."
            }
            Link { to: Route::Catalog {}, class: PRIMARY_BUTTON, "Перейти к компонентам" }
        }
    }
}
