// src/lib.rs

//! UPS Calc - client for the UPS power sizing service
//!
//! Browse the component catalog, collect components into a draft bid, size
//! the required UPS power on the server and moderate submitted bids. The
//! stores are usable headless; the `ui` module renders them with Dioxus on
//! desktop and in the browser.

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::result_large_err)]

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    if let Err(e) = tracing_wasm::try_set_as_global_default() {
        web_sys::console::error_1(&format!("Failed to set up tracing: {:?}", e).into());
    }

    dioxus::launch(ui::App);
}

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod manager;
pub mod platform;
pub mod store;
pub mod ui;
pub mod utils;

#[cfg(not(target_arch = "wasm32"))]
pub mod logging;

pub use api::ApiClient;
pub use app::{AppStores, ApplicationCore};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use manager::{Manager, ManagerState, ManagerStatus};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
