// src/ui/mod.rs - Dioxus presentation layer

pub mod app;
pub mod components;
pub mod layout;
pub mod pages;
pub mod router;
pub mod state;

pub use app::App;
pub use router::Route;
pub use state::{use_stores, use_ui, UiState};
