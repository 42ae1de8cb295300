//! Declarative view configuration.
//!
//! A [`ViewConfig`] describes one list view: which fields free-text search
//! looks at, which filters are offered, and the initial state of filters,
//! sort and pagination. It can be built in code or loaded from JSON or
//! YAML, and is validated before an engine accepts it.
//!
//! ```
//! use sifter::{ViewConfig, FilterKind};
//!
//! let config = ViewConfig::from_yaml_str(r#"
//! searchableFields: [name, email]
//! filters:
//!   - key: role
//!     label: Role
//!     kind: select
//!     options:
//!       - { value: ADMIN, label: Admin }
//!       - { value: CLIENT, label: Client }
//!   - key: createdAt
//!     label: Created
//!     kind: dateRange
//! initialSort: { key: name, direction: asc }
//! pageSize: 25
//! "#).unwrap();
//!
//! assert_eq!(config.filters[1].kind, FilterKind::DateRange);
//! assert_eq!(config.page_size, 25);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::filter::{FilterValue, Filters};
use crate::ordering::SortSpec;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default delay between the last keystroke and the search running.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// The semantic type of a filter, selecting its comparison rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterKind {
    /// Exact, typed equality against one of a set of options.
    Select,
    /// Case-insensitive substring match.
    Text,
    /// Numeric equality.
    Number,
    /// Same calendar day.
    Date,
    /// Inclusive timestamp range.
    DateRange,
    /// A kind this version does not know. Filters of this kind pass every
    /// record.
    Unknown(String),
}

impl FilterKind {
    /// Returns the configuration name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            FilterKind::Select => "select",
            FilterKind::Text => "text",
            FilterKind::Number => "number",
            FilterKind::Date => "date",
            FilterKind::DateRange => "dateRange",
            FilterKind::Unknown(name) => name,
        }
    }
}

impl From<String> for FilterKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "select" => FilterKind::Select,
            "text" => FilterKind::Text,
            "number" => FilterKind::Number,
            "date" => FilterKind::Date,
            "dateRange" | "date_range" | "daterange" => FilterKind::DateRange,
            _ => FilterKind::Unknown(name),
        }
    }
}

impl From<FilterKind> for String {
    fn from(kind: FilterKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice of a select filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// The value records are compared against.
    pub value: FilterValue,
    /// Display text.
    pub label: String,
}

impl FilterOption {
    /// Creates a new option.
    pub fn new(value: impl Into<FilterValue>, label: impl Into<String>) -> Self {
        FilterOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A filter offered by a list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Record field the filter reads. Unique within a configuration.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Comparison rule.
    #[serde(alias = "type")]
    pub kind: FilterKind,
    /// Choices, for select filters only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FilterOption>>,
}

impl FilterDefinition {
    /// Creates a definition of any kind, without options.
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        FilterDefinition {
            key: key.into(),
            label: label.into(),
            kind,
            options: None,
        }
    }

    /// Creates a select filter with the given options.
    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        options: impl IntoIterator<Item = FilterOption>,
    ) -> Self {
        FilterDefinition {
            options: Some(options.into_iter().collect()),
            ..FilterDefinition::new(key, label, FilterKind::Select)
        }
    }

    /// Creates a substring text filter.
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        FilterDefinition::new(key, label, FilterKind::Text)
    }

    /// Creates a numeric equality filter.
    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        FilterDefinition::new(key, label, FilterKind::Number)
    }

    /// Creates a same-day filter.
    pub fn date(key: impl Into<String>, label: impl Into<String>) -> Self {
        FilterDefinition::new(key, label, FilterKind::Date)
    }

    /// Creates an inclusive date range filter.
    pub fn date_range(key: impl Into<String>, label: impl Into<String>) -> Self {
        FilterDefinition::new(key, label, FilterKind::DateRange)
    }

    /// Returns the label of the option whose value equals `value`.
    pub fn option_label(&self, value: &FilterValue) -> Option<&str> {
        self.options
            .as_ref()?
            .iter()
            .find(|option| option.value == *value)
            .map(|option| option.label.as_str())
    }
}

/// Configuration of one list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    /// Fields free-text search examines. Empty means every string or
    /// number field.
    pub searchable_fields: Vec<String>,
    /// Filters offered by the view, in display order.
    pub filters: Vec<FilterDefinition>,
    /// Filter values in effect when the view opens.
    pub initial_filters: Filters,
    /// Sort in effect when the view opens.
    pub initial_sort: Option<SortSpec>,
    /// Records per page.
    pub page_size: usize,
    /// Search debounce delay in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            searchable_fields: Vec::new(),
            filters: Vec::new(),
            initial_filters: Filters::new(),
            initial_sort: None,
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl ViewConfig {
    /// Creates a configuration with no search fields, no filters and the
    /// default page size and debounce.
    pub fn new() -> Self {
        ViewConfig::default()
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ViewConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the searchable fields.
    pub fn searchable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a filter definition.
    pub fn filter(mut self, definition: FilterDefinition) -> Self {
        self.filters.push(definition);
        self
    }

    /// Sets an initial filter value.
    pub fn initial_filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.initial_filters.set(key, value);
        self
    }

    /// Sets the initial sort.
    pub fn initial_sort(mut self, spec: SortSpec) -> Self {
        self.initial_sort = Some(spec);
        self
    }

    /// Sets the page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the search debounce delay.
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce_ms = delay.as_millis() as u64;
        self
    }

    /// Returns the debounce delay.
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Looks up a filter definition by key.
    pub fn definition(&self, key: &str) -> Option<&FilterDefinition> {
        self.filters.iter().find(|def| def.key == key)
    }

    /// Checks the structural invariants of the configuration.
    ///
    /// Filter keys must be non-empty and unique, options are only allowed
    /// on select filters, and search and sort keys must name a field.
    pub fn validate(&self) -> Result<()> {
        if self.searchable_fields.iter().any(|field| field.is_empty()) {
            return Err(ConfigError::EmptySearchField);
        }

        let mut seen = HashSet::new();
        for def in &self.filters {
            if def.key.is_empty() {
                return Err(ConfigError::EmptyFilterKey);
            }
            if !seen.insert(def.key.as_str()) {
                return Err(ConfigError::DuplicateFilterKey(def.key.clone()));
            }
            if def.options.is_some() && def.kind != FilterKind::Select {
                return Err(ConfigError::OptionsOnNonSelect {
                    key: def.key.clone(),
                    kind: def.kind.to_string(),
                });
            }
        }

        if let Some(sort) = &self.initial_sort {
            if sort.key.is_empty() {
                return Err(ConfigError::EmptySortKey);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::Dir;
    use crate::value::Number;

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            FilterKind::Select,
            FilterKind::Text,
            FilterKind::Number,
            FilterKind::Date,
            FilterKind::DateRange,
        ] {
            assert_eq!(FilterKind::from(kind.to_string()), kind);
        }
        assert_eq!(FilterKind::from("date_range".to_string()), FilterKind::DateRange);
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let def: FilterDefinition =
            serde_json::from_str(r#"{"key": "mood", "label": "Mood", "kind": "slider"}"#).unwrap();
        assert_eq!(def.kind, FilterKind::Unknown("slider".into()));
        assert_eq!(serde_json::to_value(&def).unwrap()["kind"], "slider");
    }

    #[test]
    fn json_defaults() {
        let config = ViewConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ViewConfig::default());
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.debounce_delay(), DEFAULT_DEBOUNCE);
    }

    #[test]
    fn json_full_document() {
        let config = ViewConfig::from_json_str(
            r#"{
                "searchableFields": ["name"],
                "filters": [
                    {"key": "role", "label": "Role", "kind": "select",
                     "options": [{"value": "CLIENT", "label": "Client"}]},
                    {"key": "age", "label": "Age", "kind": "number"}
                ],
                "initialFilters": {"role": "CLIENT", "age": 30},
                "initialSort": {"key": "name", "direction": "desc"},
                "pageSize": 5,
                "debounceMs": 150
            }"#,
        )
        .unwrap();

        assert_eq!(config.searchable_fields, vec!["name"]);
        assert_eq!(config.filters.len(), 2);
        assert_eq!(
            config.initial_filters.get("role"),
            Some(&FilterValue::Text("CLIENT".into()))
        );
        assert_eq!(
            config.initial_filters.get("age"),
            Some(&FilterValue::Number(Number::I64(30)))
        );
        assert_eq!(config.initial_sort, Some(SortSpec::new("name", Dir::Desc)));
        assert_eq!(config.page_size, 5);
        assert_eq!(config.debounce_delay(), Duration::from_millis(150));
    }

    #[test]
    fn builder_matches_parsed() {
        let built = ViewConfig::new()
            .searchable_fields(["name"])
            .filter(FilterDefinition::select(
                "role",
                "Role",
                [FilterOption::new("CLIENT", "Client")],
            ))
            .page_size(5);
        let parsed = ViewConfig::from_json_str(
            r#"{"searchableFields": ["name"], "pageSize": 5,
                "filters": [{"key": "role", "label": "Role", "kind": "select",
                             "options": [{"value": "CLIENT", "label": "Client"}]}]}"#,
        )
        .unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let config = ViewConfig::new()
            .filter(FilterDefinition::text("name", "Name"))
            .filter(FilterDefinition::text("name", "Name again"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateFilterKey(key)) if key == "name"
        ));
    }

    #[test]
    fn rejects_empty_keys() {
        let config = ViewConfig::new().filter(FilterDefinition::text("", "Nothing"));
        assert!(matches!(config.validate(), Err(ConfigError::EmptyFilterKey)));

        let config = ViewConfig::new().searchable_fields([""]);
        assert!(matches!(config.validate(), Err(ConfigError::EmptySearchField)));

        let config = ViewConfig::new().initial_sort(SortSpec::asc(""));
        assert!(matches!(config.validate(), Err(ConfigError::EmptySortKey)));
    }

    #[test]
    fn rejects_options_on_non_select() {
        let mut def = FilterDefinition::text("name", "Name");
        def.options = Some(vec![FilterOption::new("a", "A")]);
        let err = ViewConfig::new().filter(def).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "filter 'name' of kind 'text' cannot declare options"
        );
    }

    #[test]
    fn invalid_documents_surface_parse_errors() {
        assert!(matches!(
            ViewConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ViewConfig::from_yaml_str("pageSize: [unclosed"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn option_label_lookup() {
        let def = FilterDefinition::select(
            "status",
            "Status",
            [
                FilterOption::new("done", "Completed"),
                FilterOption::new(2i64, "Two"),
            ],
        );
        assert_eq!(
            def.option_label(&FilterValue::from("done")),
            Some("Completed")
        );
        assert_eq!(def.option_label(&FilterValue::from(2i64)), Some("Two"));
        assert_eq!(def.option_label(&FilterValue::from("other")), None);
    }
}
