//! Search stage: case-insensitive substring search over records.
//!
//! With an explicit field list only those fields are examined; otherwise
//! every string or number field of a record is. A blank term matches
//! everything.
//!
//! [`SearchIndex`] precomputes the lower-cased text of each record's
//! searchable fields so repeated searches over the same collection only pay
//! for the substring tests.

use crate::record::Record;
use crate::value::Value;

/// Returns `true` if the term constrains nothing (empty or whitespace).
pub fn is_blank(term: &str) -> bool {
    term.trim().is_empty()
}

/// Collects the lower-cased text a search term is matched against.
fn haystacks<R: Record>(record: &R, fields: &[String]) -> Vec<String> {
    if fields.is_empty() {
        record
            .field_values()
            .into_iter()
            .filter(|(_, value)| value.is_searchable_scalar())
            .filter_map(|(_, value)| value.to_text().map(|t| t.to_lowercase()))
            .collect()
    } else {
        fields
            .iter()
            .filter_map(|field| record.field_value(field).to_text().map(|t| t.to_lowercase()))
            .collect()
    }
}

/// Tests a single record against a lower-cased, non-blank term.
fn record_matches<R: Record>(record: &R, needle: &str, fields: &[String]) -> bool {
    let hit = |value: Value<'_>| {
        value
            .to_text()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    };

    if fields.is_empty() {
        record
            .field_values()
            .into_iter()
            .any(|(_, value)| value.is_searchable_scalar() && hit(value))
    } else {
        fields.iter().any(|field| hit(record.field_value(field)))
    }
}

/// Returns the positions of records matching `term`, in input order.
pub fn search_positions<R: Record>(records: &[R], term: &str, fields: &[String]) -> Vec<usize> {
    if is_blank(term) {
        return (0..records.len()).collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record_matches(*record, &needle, fields))
        .map(|(pos, _)| pos)
        .collect()
}

/// Returns the records matching `term`, in input order.
///
/// ```
/// use sifter::search;
/// use serde_json::json;
///
/// let rows = vec![json!({"name": "Ann"}), json!({"name": "Bob"})];
/// let hits = search(&rows, "b", &["name".to_string()]);
/// assert_eq!(hits, vec![&rows[1]]);
/// ```
pub fn search<'a, R: Record>(records: &'a [R], term: &str, fields: &[String]) -> Vec<&'a R> {
    search_positions(records, term, fields)
        .into_iter()
        .map(|pos| &records[pos])
        .collect()
}

/// Lower-cased searchable text for every record of a collection.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<Vec<String>>,
}

impl SearchIndex {
    /// Builds the index for `records` over `fields` (all scalar fields when
    /// empty).
    pub fn build<R: Record>(records: &[R], fields: &[String]) -> Self {
        SearchIndex {
            entries: records
                .iter()
                .map(|record| haystacks(record, fields))
                .collect(),
        }
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no records are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the positions of records matching `term`.
    ///
    /// Yields exactly what [`search_positions`] yields for the indexed
    /// collection.
    pub fn search(&self, term: &str) -> Vec<usize> {
        if is_blank(term) {
            return (0..self.entries.len()).collect();
        }
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, texts)| texts.iter().any(|text| text.contains(&needle)))
            .map(|(pos, _)| pos)
            .collect()
    }
}
