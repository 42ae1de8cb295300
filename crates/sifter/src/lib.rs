//! Sifter - In-memory query engine for tabular list views.
//!
//! Sifter turns a collection of records plus the user's view state into the
//! page of rows a list screen should show. It supports:
//!
//! - Case-insensitive free-text search, debounced while the user types
//! - Typed filters: select, text, number, date and date range
//! - Single-column sorting with nulls last and accent-aware text collation
//! - Pagination that clamps instead of failing
//! - Derived metrics for empty states and filter badges
//! - Per-stage memoization, so cheap changes stay cheap
//!
//! # Quick Start
//!
//! ```rust
//! use sifter::{FilterDefinition, FilterOption, QueryEngine, Record, Value, ViewConfig};
//!
//! struct User {
//!     name: String,
//!     role: &'static str,
//! }
//!
//! impl Record for User {
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "name" => Value::String(&self.name),
//!             "role" => Value::String(self.role),
//!             _ => Value::None,
//!         }
//!     }
//!
//!     fn field_values(&self) -> Vec<(&str, Value<'_>)> {
//!         vec![("name", self.field_value("name")), ("role", self.field_value("role"))]
//!     }
//! }
//!
//! let users = vec![
//!     User { name: "Ann".into(), role: "ADMIN" },
//!     User { name: "Bob".into(), role: "CLIENT" },
//!     User { name: "Cid".into(), role: "CLIENT" },
//! ];
//!
//! let config = ViewConfig::new()
//!     .searchable_fields(["name"])
//!     .filter(FilterDefinition::select(
//!         "role",
//!         "Role",
//!         [FilterOption::new("ADMIN", "Admin"), FilterOption::new("CLIENT", "Client")],
//!     ))
//!     .page_size(2);
//!
//! let mut engine = QueryEngine::new(config, users).unwrap();
//! engine.update_filter("role", "CLIENT");
//! engine.set_search_term("b");
//! engine.flush_search();
//!
//! let page = engine.page();
//! assert_eq!(page.items.len(), 1);
//! assert_eq!(page.items[0].name, "Bob");
//! assert_eq!(engine.filter_summary().as_deref(), Some("Role: Client"));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! records ─► search(effective term) ─► filter(values) ─► sort(spec) ─► paginate
//! ```
//!
//! - **Search**: a record matches if any searchable field contains the
//!   lowercased term. A blank term matches everything.
//! - **Filter**: every active filter must match (AND). Empty values are
//!   inactive.
//! - **Sort**: stable, nulls last in either direction.
//! - **Paginate**: the shown page is clamped to the available pages.
//!
//! The stages are also available as free functions ([`search`], [`filter`],
//! [`sort`], [`page_slice`]) for callers that manage their own state.
//!
//! # Filter Kinds
//!
//! | Kind | Matches when |
//! |------|--------------|
//! | `select` | field equals the value |
//! | `text` | field contains the value, case-insensitive |
//! | `number` | field equals the value numerically |
//! | `date` | field falls on the same day |
//! | `dateRange` | field falls within both bounds, inclusive |

mod config;
mod debounce;
mod engine;
mod error;
mod filter;
mod memo;
mod metrics;
mod ordering;
mod pagination;
mod record;
mod search;
mod value;

// Re-export public API
pub use config::{
    FilterDefinition, FilterKind, FilterOption, ViewConfig, DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE,
};
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
pub use engine::{Page, QueryEngine, StageStats};
pub use error::{ConfigError, Result};
pub use filter::{filter, filter_positions, filter_summary, matches_all, FilterValue, Filters};
pub use metrics::Metrics;
pub use ordering::{collate, compare_values, sort, sort_positions, Dir, SortSpec};
pub use pagination::{page_slice, PageInfo, Pagination};
pub use record::{json_value, Record};
pub use search::{is_blank, search, search_positions, SearchIndex};
pub use value::{Number, Timestamp, Value};
