// src/ui/pages/mod.rs - Routed pages

mod bid_details;
mod bid_editor;
mod bids;
mod catalog;
mod component;
mod home;
mod login;
mod not_found;
mod profile;
mod register;

pub use bid_details::BidDetails;
pub use bid_editor::BidEditor;
pub use bids::Bids;
pub use catalog::Catalog;
pub use component::ComponentDetail;
pub use home::Home;
pub use login::Login;
pub use not_found::NotFound;
pub use profile::Profile;
pub use register::Register;

pub(crate) const INPUT: &str = "appearance-none rounded-md block w-full px-3 py-2 border border-gray-300 placeholder-gray-500 text-gray-900 focus:outline-none focus:ring-blue-500 focus:border-blue-500 sm:text-sm";
pub(crate) const PRIMARY_BUTTON: &str = "inline-flex justify-center px-4 py-2 border border-transparent text-sm font-medium rounded-md text-white bg-blue-600 hover:bg-blue-700 disabled:opacity-50";
pub(crate) const SECONDARY_BUTTON: &str = "inline-flex justify-center px-4 py-2 border border-gray-300 text-sm font-medium rounded-md text-gray-700 bg-white hover:bg-gray-50 disabled:opacity-50";
pub(crate) const DANGER_BUTTON: &str = "inline-flex justify-center px-4 py-2 border border-transparent text-sm font-medium rounded-md text-white bg-red-600 hover:bg-red-700 disabled:opacity-50";

/// Parses a decimal typed with either separator.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(" 12,5 "), Some(12.5));
        assert_eq!(parse_decimal("3"), Some(3.0));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }
}
