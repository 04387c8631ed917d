// src/store/search.rs - Ephemeral catalog search state

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub const HISTORY_LIMIT: usize = 10;

/// Inclusive bounds on a component's power
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PowerRange {
    pub fn contains(&self, power: f64) -> bool {
        self.min.map_or(true, |min| power >= min) && self.max.map_or(true, |max| power <= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub power_range: Option<PowerRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub search_value: String,
    /// Newest first, no duplicates
    pub previous_searches: Vec<String>,
    pub filters: SearchFilters,
}

#[derive(Debug, Clone, Default)]
pub struct SearchStore {
    state: Arc<RwLock<SearchState>>,
}

impl SearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> SearchState {
        self.state.read().await.clone()
    }

    pub async fn set_search_value(&self, value: impl Into<String>) {
        self.state.write().await.search_value = value.into();
    }

    /// Moves `term` to the front of the history. Blank terms are ignored.
    pub async fn add_to_history(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        let mut state = self.state.write().await;
        state.previous_searches.retain(|existing| existing != term);
        state.previous_searches.insert(0, term.to_string());
        state.previous_searches.truncate(HISTORY_LIMIT);
    }

    /// Clears the search text and keeps history and filters.
    pub async fn clear_search(&self) {
        self.state.write().await.search_value.clear();
    }

    /// Merges the given filters into the current ones.
    pub async fn set_filters(&self, filters: SearchFilters) {
        let mut state = self.state.write().await;
        if filters.category.is_some() {
            state.filters.category = filters.category;
        }
        if filters.power_range.is_some() {
            state.filters.power_range = filters.power_range;
        }
    }

    pub async fn clear_filters(&self) {
        self.state.write().await.filters = SearchFilters::default();
    }

    pub async fn reset(&self) {
        *self.state.write().await = SearchState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_history_dedupes_and_caps() {
        let store = SearchStore::new();
        for i in 0..12 {
            store.add_to_history(&format!("term {}", i)).await;
        }
        store.add_to_history("term 5").await;
        store.add_to_history("   ").await;

        let state = store.snapshot().await;
        assert_eq!(state.previous_searches.len(), HISTORY_LIMIT);
        assert_eq!(state.previous_searches[0], "term 5");
        assert_eq!(state.previous_searches[1], "term 11");
        assert_eq!(
            state.previous_searches.iter().filter(|t| *t == "term 5").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_clear_search_keeps_history_and_filters() {
        let store = SearchStore::new();
        store.set_search_value("ибп").await;
        store.add_to_history("ибп").await;
        store
            .set_filters(SearchFilters {
                category: Some("servers".to_string()),
                power_range: None,
            })
            .await;
        store
            .set_filters(SearchFilters {
                category: None,
                power_range: Some(PowerRange {
                    min: Some(0.1),
                    max: None,
                }),
            })
            .await;

        store.clear_search().await;
        let state = store.snapshot().await;
        assert!(state.search_value.is_empty());
        assert_eq!(state.previous_searches, vec!["ибп".to_string()]);
        assert_eq!(state.filters.category.as_deref(), Some("servers"));
        assert!(state.filters.power_range.is_some());

        store.reset().await;
        assert_eq!(store.snapshot().await, SearchState::default());
    }

    #[test]
    fn test_power_range_bounds_inclusive() {
        let range = PowerRange {
            min: Some(0.25),
            max: Some(0.5),
        };
        assert!(range.contains(0.25));
        assert!(range.contains(0.5));
        assert!(!range.contains(0.1));
        assert!(PowerRange::default().contains(100.0));
    }
}
