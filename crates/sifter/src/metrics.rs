//! Derived metrics for UI affordances.
//!
//! These are pure functions of the engine state; they tell a view whether
//! to show "no records yet" versus "nothing matches", badge the filter
//! button, and so on.

use serde::Serialize;

use crate::filter::Filters;

/// Counts and flags derived from the current query state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Filter entries with a non-empty value.
    pub active_filters_count: usize,
    /// Any filter is active or the search box is non-empty.
    pub is_filtered: bool,
    /// Records remain after search and filters.
    pub has_data: bool,
    /// The raw collection holds no records at all.
    pub is_empty: bool,
}

impl Metrics {
    /// Derives metrics from the engine inputs and the result size.
    ///
    /// `search_term` is the raw term as typed, not the debounced one, so the
    /// view reacts to typing immediately.
    pub fn compute(filters: &Filters, search_term: &str, total_items: usize, raw_len: usize) -> Self {
        let active_filters_count = filters.active_count();
        Metrics {
            active_filters_count,
            is_filtered: active_filters_count > 0 || !search_term.is_empty(),
            has_data: total_items > 0,
            is_empty: raw_len == 0,
        }
    }
}
