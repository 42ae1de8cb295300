//! The query engine: one list view's state and its memoized pipeline.
//!
//! [`QueryEngine`] owns the inputs of a list view (records, search term,
//! filter values, sort, page) and keeps the derived result up to date:
//!
//! ```text
//! records ─► search ─► filter ─► sort ─► paginate ─► page()
//! ```
//!
//! Every setter recomputes eagerly, but each stage is cached on its own
//! inputs, so changing the page size never re-runs search, and changing the
//! sort never re-runs the filters. Stage outputs are record positions, so
//! the collection itself is never copied or reordered.
//!
//! # Example
//!
//! ```
//! use sifter::{FilterDefinition, FilterOption, QueryEngine, ViewConfig};
//! use serde_json::json;
//!
//! let records = vec![
//!     json!({"id": 1, "name": "Ann", "role": "ADMIN"}),
//!     json!({"id": 2, "name": "Bob", "role": "CLIENT"}),
//!     json!({"id": 3, "name": "Cid", "role": "CLIENT"}),
//! ];
//! let config = ViewConfig::new()
//!     .searchable_fields(["name"])
//!     .filter(FilterDefinition::select(
//!         "role",
//!         "Role",
//!         [FilterOption::new("ADMIN", "Admin"), FilterOption::new("CLIENT", "Client")],
//!     ));
//!
//! let mut engine = QueryEngine::new(config, records).unwrap();
//! engine.update_filter("role", "CLIENT");
//! engine.update_sort("name");
//! engine.update_sort("name");
//!
//! let names: Vec<_> = engine.page().items.iter().map(|r| r["name"].clone()).collect();
//! assert_eq!(names, vec![json!("Cid"), json!("Bob")]);
//! assert_eq!(engine.metrics().active_filters_count, 1);
//! ```

use std::time::Instant;

use serde::Serialize;

use crate::config::ViewConfig;
use crate::debounce::{Clock, Debouncer, SystemClock};
use crate::error::Result;
use crate::filter::{filter_positions, filter_summary, FilterValue, Filters};
use crate::memo::Memo;
use crate::metrics::Metrics;
use crate::ordering::{sort_positions, SortSpec};
use crate::pagination::{page_slice, PageInfo, Pagination};
use crate::record::Record;
use crate::search::{is_blank, SearchIndex};

/// One page of results, ready for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a, R> {
    /// Records on this page, in display order.
    pub items: Vec<&'a R>,
    /// Page bounds.
    #[serde(flatten)]
    pub info: PageInfo,
    /// A previous page exists.
    pub has_previous: bool,
    /// A next page exists.
    pub has_next: bool,
}

/// How many times each stage has run since the engine was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StageStats {
    pub search: u64,
    pub filter: u64,
    pub sort: u64,
}

/// Search, filter, sort and pagination state for one list view.
pub struct QueryEngine<R, C = SystemClock> {
    config: ViewConfig,
    clock: C,

    records: Vec<R>,
    data_version: u64,
    index: SearchIndex,
    indexed_version: Option<u64>,

    search_term: String,
    effective_term: String,
    debouncer: Debouncer<String>,
    filters: Filters,
    filters_version: u64,
    sort: Option<SortSpec>,
    pagination: Pagination,

    search_memo: Memo<(u64, String)>,
    filter_memo: Memo<(u64, u64)>,
    sort_memo: Memo<(u64, Option<SortSpec>)>,
}

impl<R: Record> QueryEngine<R> {
    /// Builds an engine on the system clock.
    ///
    /// Fails only if `config` is invalid.
    pub fn new(config: ViewConfig, records: Vec<R>) -> Result<Self> {
        QueryEngine::with_clock(config, records, SystemClock)
    }
}

impl<R: Record, C: Clock> QueryEngine<R, C> {
    /// Builds an engine that reads time from `clock`.
    pub fn with_clock(config: ViewConfig, records: Vec<R>, clock: C) -> Result<Self> {
        config.validate()?;

        let mut engine = QueryEngine {
            clock,
            records,
            data_version: 0,
            index: SearchIndex::default(),
            indexed_version: None,
            search_term: String::new(),
            effective_term: String::new(),
            debouncer: Debouncer::new(config.debounce_delay()),
            filters: config.initial_filters.clone(),
            filters_version: 0,
            sort: config.initial_sort.clone(),
            pagination: Pagination::new(config.page_size),
            search_memo: Memo::new("search"),
            filter_memo: Memo::new("filter"),
            sort_memo: Memo::new("sort"),
            config,
        };
        engine.recompute();
        Ok(engine)
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    fn recompute(&mut self) {
        let term = &self.effective_term;
        if !is_blank(term) && self.indexed_version != Some(self.data_version) {
            self.index = SearchIndex::build(&self.records, &self.config.searchable_fields);
            self.indexed_version = Some(self.data_version);
            tracing::debug!(records = self.index.len(), "search index rebuilt");
        }

        let index = &self.index;
        let record_count = self.records.len();
        self.search_memo
            .refresh((self.data_version, term.clone()), || {
                if is_blank(term) {
                    (0..record_count).collect()
                } else {
                    index.search(term)
                }
            });

        let searched = self.search_memo.output();
        let (records, definitions, filters) =
            (&self.records, &self.config.filters, &self.filters);
        self.filter_memo.refresh(
            (self.search_memo.generation(), self.filters_version),
            || filter_positions(records, searched, definitions, filters),
        );

        let filtered = self.filter_memo.output();
        let sort = self.sort.as_ref();
        self.sort_memo
            .refresh((self.filter_memo.generation(), self.sort.clone()), || {
                sort_positions(records, filtered, sort)
            });
    }

    /// Positions of all result records, in display order.
    fn result_positions(&self) -> &[usize] {
        self.sort_memo.output()
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Replaces the record collection, e.g. after a refetch.
    ///
    /// The current page is kept and clamped on read if the result shrank.
    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.data_version += 1;
        tracing::debug!(records = self.records.len(), "records replaced");
        self.recompute();
    }

    /// The raw record collection.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// All records passing search and filters, sorted, unpaginated.
    pub fn results(&self) -> Vec<&R> {
        self.result_positions()
            .iter()
            .map(|&pos| &self.records[pos])
            .collect()
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// The search term as typed.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// The debounced term the pipeline currently uses.
    pub fn effective_search_term(&self) -> &str {
        &self.effective_term
    }

    /// Records a keystroke. The term takes effect once it has been left
    /// unchanged for the debounce delay; see [`tick`](Self::tick).
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        let now = self.clock.now();
        self.debouncer.schedule(self.search_term.clone(), now);
        self.tick();
    }

    /// Applies a pending search term whose delay has elapsed. Returns
    /// `true` if the term was applied.
    pub fn tick(&mut self) -> bool {
        match self.debouncer.poll(self.clock.now()) {
            Some(term) => {
                self.apply_search_term(term);
                true
            }
            None => false,
        }
    }

    /// Applies a pending search term now, skipping the remaining delay.
    pub fn flush_search(&mut self) -> bool {
        match self.debouncer.flush() {
            Some(term) => {
                self.apply_search_term(term);
                true
            }
            None => false,
        }
    }

    /// When the pending search term becomes due, if one is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Returns `true` while a typed term waits out the debounce delay.
    pub fn is_search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    fn apply_search_term(&mut self, term: String) {
        if term == self.effective_term {
            return;
        }
        tracing::debug!(term = %term, "search term applied");
        self.effective_term = term;
        self.pagination.reset();
        self.recompute();
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Current filter values.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Sets one filter value. Setting a value equal to the current one is
    /// a no-op; otherwise the view returns to page 1.
    pub fn update_filter(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        if self.config.definition(&key).is_none() {
            tracing::warn!(key = %key, "filter value set for a key with no definition");
        }
        if self.filters.set(key, value) {
            self.filters_changed();
        }
    }

    /// Removes one filter value.
    pub fn remove_filter(&mut self, key: &str) {
        if self.filters.remove(key).is_some() {
            self.filters_changed();
        }
    }

    /// Clears every filter value and the search term, cancelling any
    /// pending keystroke.
    pub fn clear_filters(&mut self) {
        self.debouncer.cancel();
        self.search_term.clear();
        self.effective_term.clear();
        self.filters.clear();
        tracing::debug!("filters cleared");
        self.filters_changed();
    }

    /// Human-readable description of the active filters.
    pub fn filter_summary(&self) -> Option<String> {
        filter_summary(&self.config.filters, &self.filters)
    }

    fn filters_changed(&mut self) {
        self.filters_version += 1;
        self.pagination.reset();
        self.recompute();
    }

    // ========================================================================
    // Sort
    // ========================================================================

    /// The active sort, if any.
    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Sorts by `key`: ascending on first use, flipping direction on each
    /// repeated call for the same key.
    pub fn update_sort(&mut self, key: &str) {
        let spec = SortSpec::toggle(self.sort.as_ref(), key);
        self.set_sort(Some(spec));
    }

    /// Replaces the sort.
    pub fn set_sort(&mut self, spec: Option<SortSpec>) {
        tracing::debug!(sort = ?spec, "sort changed");
        self.sort = spec;
        self.pagination.reset();
        self.recompute();
    }

    /// Removes the sort; results keep filtered order.
    pub fn clear_sort(&mut self) {
        self.set_sort(None);
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Number of records passing search and filters.
    pub fn total_items(&self) -> usize {
        self.result_positions().len()
    }

    /// Bounds of the page shown.
    pub fn page_info(&self) -> PageInfo {
        self.pagination.info(self.total_items())
    }

    /// The page shown, 1-based.
    pub fn current_page(&self) -> usize {
        self.page_info().current_page
    }

    /// Records per page.
    pub fn page_size(&self) -> usize {
        self.pagination.page_size()
    }

    /// The records of the page shown, with its bounds.
    pub fn page(&self) -> Page<'_, R> {
        let info = self.page_info();
        let items = page_slice(self.result_positions(), &info)
            .iter()
            .map(|&pos| &self.records[pos])
            .collect();
        Page {
            items,
            has_previous: info.has_previous(),
            has_next: info.has_next(),
            info,
        }
    }

    /// Jumps to page `page`, clamped to the available pages.
    pub fn go_to_page(&mut self, page: i64) {
        let total = self.total_items();
        self.pagination.go_to(page, total);
    }

    /// Jumps to the first page.
    pub fn first_page(&mut self) {
        let total = self.total_items();
        self.pagination.first(total);
    }

    /// Jumps to the last page.
    pub fn last_page(&mut self) {
        let total = self.total_items();
        self.pagination.last(total);
    }

    /// Moves one page back.
    pub fn previous_page(&mut self) {
        let total = self.total_items();
        self.pagination.previous(total);
    }

    /// Moves one page forward.
    pub fn next_page(&mut self) {
        let total = self.total_items();
        self.pagination.next(total);
    }

    /// Changes the page size. A size of 0 is raised to 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.pagination.set_page_size(page_size);
    }

    // ========================================================================
    // Derived state
    // ========================================================================

    /// Counts and flags for the view.
    pub fn metrics(&self) -> Metrics {
        Metrics::compute(
            &self.filters,
            &self.search_term,
            self.total_items(),
            self.records.len(),
        )
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Stage recomputation counters.
    pub fn stage_stats(&self) -> StageStats {
        StageStats {
            search: self.search_memo.computations(),
            filter: self.filter_memo.computations(),
            sort: self.sort_memo.computations(),
        }
    }
}
