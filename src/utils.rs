// src/utils.rs

//! Small helpers shared by the stores and the UI

pub mod time;

pub use time::Time;

/// Lowercased, trimmed form used for case-insensitive matching.
pub fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Case-insensitive substring test. An empty needle matches everything.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    let needle = fold(needle);
    needle.is_empty() || haystack.to_lowercase().contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_folded() {
        assert!(contains_folded("Admin2", "admin"));
        assert!(contains_folded("anything", "  "));
        assert!(!contains_folded("user", "admin"));
    }
}
