//! Filter stage: typed filter values and their per-kind predicates.
//!
//! A record passes the stage when it satisfies every configured filter
//! whose current value is non-empty. How a single filter compares depends
//! on its [`FilterKind`]:
//!
//! | Kind | Rule |
//! |------|------|
//! | `select` | typed equality |
//! | `text` | case-insensitive substring, missing field reads as `""` |
//! | `number` | numeric equality after coercion |
//! | `date` | same UTC calendar day |
//! | `dateRange` | inclusive `[start, end]`; a half-open pair is no constraint |
//! | unknown | passes everything |
//!
//! Coercion failures never raise: they make the predicate non-matching.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use crate::config::{FilterDefinition, FilterKind};
use crate::record::{json_number, Record};
use crate::value::{Number, Timestamp, Value};

/// Current value of one filter.
///
/// Values arriving from forms or JSON are usually text; the predicates
/// coerce them as the filter kind requires, so `Text("42")` works for a
/// number filter and `Text("2024-03-01")` for a date filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Json", into = "Json")]
pub enum FilterValue {
    /// No value. Imposes no constraint.
    #[default]
    Null,
    /// Text value. Empty text imposes no constraint.
    Text(String),
    /// Numeric value.
    Number(Number),
    /// Boolean value.
    Bool(bool),
    /// Single point in time.
    Date(Timestamp),
    /// Inclusive range. Only constrains when both bounds are set.
    DateRange {
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    },
}

impl FilterValue {
    /// Creates a date range value.
    pub fn date_range(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        FilterValue::DateRange { start, end }
    }

    /// Returns `true` for values that impose no constraint and do not
    /// count as active: null and empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Coerces the value to text for substring matching and display.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FilterValue::Null | FilterValue::DateRange { .. } => None,
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Number(n) => Some(n.to_string()),
            FilterValue::Bool(b) => Some(b.to_string()),
            FilterValue::Date(t) => t.to_rfc3339(),
        }
    }

    /// Coerces the value to a number.
    pub fn to_number(&self) -> Option<Number> {
        match self {
            FilterValue::Number(n) if !n.is_nan() => Some(*n),
            FilterValue::Text(s) => Number::parse(s),
            _ => None,
        }
    }

    /// Coerces the value to a timestamp.
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        match self {
            FilterValue::Date(t) => Some(*t),
            FilterValue::Text(s) => Timestamp::parse(s),
            FilterValue::Number(n) if n.to_f64().is_finite() => {
                Some(Timestamp::from_millis(n.to_f64() as i64))
            }
            _ => None,
        }
    }

    /// Returns both bounds of a range, if this is a complete range.
    pub fn range_bounds(&self) -> Option<(Timestamp, Timestamp)> {
        match self {
            FilterValue::DateRange {
                start: Some(start),
                end: Some(end),
            } => Some((*start, *end)),
            _ => None,
        }
    }

    /// Typed equality against a record value, as select filters use it.
    fn equals(&self, field: &Value<'_>) -> bool {
        match (self, field) {
            (FilterValue::Text(expected), Value::String(actual)) => expected == actual,
            (FilterValue::Number(expected), Value::Number(actual)) => actual.numeric_eq(*expected),
            (FilterValue::Bool(expected), Value::Bool(actual)) => expected == actual,
            (FilterValue::Date(expected), Value::Timestamp(actual)) => expected == actual,
            _ => false,
        }
    }
}

fn json_timestamp(value: &Json) -> Option<Timestamp> {
    match value {
        Json::String(s) => Timestamp::parse(s),
        Json::Number(n) => n.as_f64().map(|ms| Timestamp::from_millis(ms as i64)),
        _ => None,
    }
}

impl From<Json> for FilterValue {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => FilterValue::Null,
            Json::Bool(b) => FilterValue::Bool(b),
            Json::String(s) => FilterValue::Text(s),
            Json::Number(n) => match json_number(&n) {
                Value::Number(n) => FilterValue::Number(n),
                _ => FilterValue::Null,
            },
            Json::Object(map) if map.contains_key("start") || map.contains_key("end") => {
                FilterValue::DateRange {
                    start: map.get("start").and_then(json_timestamp),
                    end: map.get("end").and_then(json_timestamp),
                }
            }
            Json::Array(items) if items.len() == 2 => FilterValue::DateRange {
                start: json_timestamp(&items[0]),
                end: json_timestamp(&items[1]),
            },
            Json::Array(_) | Json::Object(_) => FilterValue::Null,
        }
    }
}

fn timestamp_json(ts: Option<Timestamp>) -> Json {
    ts.and_then(Timestamp::to_rfc3339)
        .map(Json::String)
        .unwrap_or(Json::Null)
}

impl From<FilterValue> for Json {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Null => Json::Null,
            FilterValue::Text(s) => Json::String(s),
            FilterValue::Number(Number::I64(n)) => Json::from(n),
            FilterValue::Number(Number::U64(n)) => Json::from(n),
            FilterValue::Number(Number::F64(n)) => serde_json::Number::from_f64(n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            FilterValue::Bool(b) => Json::Bool(b),
            FilterValue::Date(ts) => timestamp_json(Some(ts)),
            FilterValue::DateRange { start, end } => serde_json::json!({
                "start": timestamp_json(start),
                "end": timestamp_json(end),
            }),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<Number> for FilterValue {
    fn from(n: Number) -> Self {
        FilterValue::Number(n)
    }
}

impl From<Timestamp> for FilterValue {
    fn from(t: Timestamp) -> Self {
        FilterValue::Date(t)
    }
}

impl From<chrono::NaiveDate> for FilterValue {
    fn from(date: chrono::NaiveDate) -> Self {
        FilterValue::Date(Timestamp::from(date))
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FilterValue::Null)
    }
}

macro_rules! filter_value_from_number {
    ($($source:ty),*) => {
        $(
            impl From<$source> for FilterValue {
                fn from(n: $source) -> Self {
                    FilterValue::Number(Number::from(n))
                }
            }
        )*
    };
}

filter_value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Current filter values keyed by filter key, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filters {
    entries: Vec<(String, FilterValue)>,
}

impl Filters {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Filters::default()
    }

    /// Sets the value for `key`, keeping its original position if the key
    /// is already present. Returns `true` if the stored value changed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> bool {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, current)) if *current == value => false,
            Some((_, current)) => {
                *current = value;
                true
            }
            None => {
                self.entries.push((key, value));
                true
            }
        }
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries, active or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose value is not empty.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| !v.is_empty()).count()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (key, value) in iter {
            filters.set(key, value);
        }
        filters
    }
}

struct FiltersVisitor;

impl<'de> Visitor<'de> for FiltersVisitor {
    type Value = Filters;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of filter keys to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Filters, A::Error> {
        let mut filters = Filters::new();
        while let Some((key, value)) = map.next_entry::<String, FilterValue>()? {
            filters.set(key, value);
        }
        Ok(filters)
    }
}

// Entries are read in document order.
impl<'de> Deserialize<'de> for Filters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FiltersVisitor)
    }
}

impl Serialize for Filters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl FilterDefinition {
    /// Evaluates this filter against one record value.
    ///
    /// `value` is assumed non-empty; empty values are skipped before this
    /// is called.
    pub fn matches(&self, field: &Value<'_>, value: &FilterValue) -> bool {
        match &self.kind {
            FilterKind::Select => value.equals(field),
            FilterKind::Text => {
                let Some(needle) = value.to_text() else {
                    return false;
                };
                let haystack = field.to_text().unwrap_or_default();
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            FilterKind::Number => match (field.to_number(), value.to_number()) {
                (Some(actual), Some(expected)) => actual.numeric_eq(expected),
                _ => false,
            },
            FilterKind::Date => {
                let actual = field.to_timestamp().and_then(Timestamp::day);
                let expected = value.to_timestamp().and_then(Timestamp::day);
                actual.is_some() && actual == expected
            }
            FilterKind::DateRange => match value.range_bounds() {
                Some((start, end)) => field
                    .to_timestamp()
                    .is_some_and(|ts| start <= ts && ts <= end),
                None => true,
            },
            FilterKind::Unknown(_) => true,
        }
    }

    /// Evaluates this filter against a record.
    pub fn matches_record<R: Record>(&self, record: &R, value: &FilterValue) -> bool {
        self.matches(&record.field_value(&self.key), value)
    }
}

/// Pairs each definition with its current value, dropping unset filters.
fn active_filters<'a>(
    definitions: &'a [FilterDefinition],
    filters: &'a Filters,
) -> Vec<(&'a FilterDefinition, &'a FilterValue)> {
    definitions
        .iter()
        .filter_map(|def| {
            filters
                .get(&def.key)
                .filter(|value| !value.is_empty())
                .map(|value| (def, value))
        })
        .collect()
}

/// Returns `true` if `record` passes every active filter.
pub fn matches_all<R: Record>(record: &R, definitions: &[FilterDefinition], filters: &Filters) -> bool {
    active_filters(definitions, filters)
        .into_iter()
        .all(|(def, value)| def.matches_record(record, value))
}

/// Keeps the positions whose records pass every active filter.
pub fn filter_positions<R: Record>(
    records: &[R],
    positions: &[usize],
    definitions: &[FilterDefinition],
    filters: &Filters,
) -> Vec<usize> {
    let active = active_filters(definitions, filters);
    if active.is_empty() {
        return positions.to_vec();
    }
    positions
        .iter()
        .copied()
        .filter(|&pos| {
            active
                .iter()
                .all(|(def, value)| def.matches_record(&records[pos], value))
        })
        .collect()
}

/// Returns the records passing every active filter, in input order.
///
/// ```
/// use sifter::{filter, FilterDefinition, Filters};
/// use serde_json::json;
///
/// let rows = vec![json!({"role": "ADMIN"}), json!({"role": "CLIENT"})];
/// let defs = [FilterDefinition::select("role", "Role", [])];
/// let filters: Filters = [("role", "CLIENT")].into_iter().collect();
/// assert_eq!(filter(&rows, &defs, &filters), vec![&rows[1]]);
/// ```
pub fn filter<'a, R: Record>(
    records: &'a [R],
    definitions: &[FilterDefinition],
    filters: &Filters,
) -> Vec<&'a R> {
    records
        .iter()
        .filter(|record| matches_all(*record, definitions, filters))
        .collect()
}

/// Describes the active filters, e.g. `Role: Client, Name contains 'bo'`.
///
/// Filters are listed in definition order. Select values show their option
/// label when one matches. Returns `None` when nothing constrains the view.
pub fn filter_summary(definitions: &[FilterDefinition], filters: &Filters) -> Option<String> {
    let parts: Vec<String> = active_filters(definitions, filters)
        .into_iter()
        .filter_map(|(def, value)| describe(def, value))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn format_day(ts: Timestamp) -> Option<String> {
    ts.day().map(|day| day.format("%Y-%m-%d").to_string())
}

fn describe(def: &FilterDefinition, value: &FilterValue) -> Option<String> {
    let label = &def.label;
    match &def.kind {
        FilterKind::Select => {
            let shown = def
                .option_label(value)
                .map(str::to_string)
                .or_else(|| value.to_text())?;
            Some(format!("{label}: {shown}"))
        }
        FilterKind::Text => Some(format!("{label} contains '{}'", value.to_text()?)),
        FilterKind::Number => Some(format!("{label} = {}", value.to_text()?)),
        FilterKind::Date => {
            let shown = value
                .to_timestamp()
                .and_then(format_day)
                .or_else(|| value.to_text())?;
            Some(format!("{label}: {shown}"))
        }
        FilterKind::DateRange => {
            let (start, end) = value.range_bounds()?;
            Some(format!("{label}: {} to {}", format_day(start)?, format_day(end)?))
        }
        FilterKind::Unknown(_) => Some(format!("{label}: {}", value.to_text()?)),
    }
}
