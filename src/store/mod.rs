// src/store/mod.rs - Client-side state containers

//! Each store is a cheap `Clone` handle over shared state. Locks are never
//! held across a network call; concurrent operations are last-write-wins.

pub mod bids;
pub mod cart;
pub mod catalog;
pub mod search;

pub use bids::{filter_bids, BidQuery, BidsState, BidsStore};
#[cfg(not(target_arch = "wasm32"))]
pub use bids::PollHandle;
pub use cart::{CartState, CartStore};
pub use catalog::{demo_components, CatalogState, CatalogStore};
pub use search::{PowerRange, SearchFilters, SearchState, SearchStore, HISTORY_LIMIT};
