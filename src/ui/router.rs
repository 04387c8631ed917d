// src/ui/router.rs
use dioxus::prelude::*;

use crate::ui::layout::Layout;
use crate::ui::pages::{
    BidDetails, BidEditor, Bids, Catalog, ComponentDetail, Home, Login, NotFound, Profile,
    Register,
};

#[derive(Clone, Routable, Debug, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/")]
        Home {},
        #[route("/components")]
        Catalog {},
        #[route("/components/:id")]
        ComponentDetail { id: i64 },
        #[route("/bidups/:id")]
        BidEditor { id: i64 },
        #[route("/biddetailsups/:id")]
        BidDetails { id: i64 },
        #[route("/bids")]
        Bids {},
        #[route("/profile")]
        Profile {},
        #[route("/login")]
        Login {},
        #[route("/register")]
        Register {},
    #[end_layout]
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

impl Route {
    /// Drafts open in the editor for their owner; every other bid opens
    /// read-only.
    pub fn for_bid(bid_id: i64, is_draft: bool, is_moderator: bool) -> Self {
        if is_draft && !is_moderator {
            Route::BidEditor { id: bid_id }
        } else {
            Route::BidDetails { id: bid_id }
        }
    }
}
