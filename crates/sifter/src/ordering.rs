//! Sort stage: direction, sort specification and the record comparator.
//!
//! Ordering is nulls-last in both directions: absent values (and NaN) always
//! follow defined ones, and only the comparison between defined values is
//! reversed for [`Dir::Desc`].
//!
//! Each value is classed before comparing. Timestamps, and strings that
//! parse as dates (`2024-03-01`, RFC 3339), compare by instant, so offsets
//! are honored. Numbers compare by exact value. Everything else, numeric
//! strings included, compares as case-insensitive, accent-folded text. When
//! a column mixes classes, timestamps come before numbers and numbers
//! before text, which keeps the comparator a total order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::value::{Number, Timestamp, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    /// Descending order (largest first).
    #[serde(alias = "descending")]
    Desc,
}

impl Dir {
    /// Returns the opposite direction.
    pub fn flip(self) -> Dir {
        match self {
            Dir::Asc => Dir::Desc,
            Dir::Desc => Dir::Asc,
        }
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The active sort: one field and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// The field to sort by.
    pub key: String,
    /// The sort direction.
    #[serde(default)]
    pub direction: Dir,
}

impl SortSpec {
    /// Creates a new ascending sort on the given field.
    pub fn asc(key: impl Into<String>) -> Self {
        SortSpec {
            key: key.into(),
            direction: Dir::Asc,
        }
    }

    /// Creates a new descending sort on the given field.
    pub fn desc(key: impl Into<String>) -> Self {
        SortSpec {
            key: key.into(),
            direction: Dir::Desc,
        }
    }

    /// Creates a new sort with the given direction.
    pub fn new(key: impl Into<String>, direction: Dir) -> Self {
        SortSpec {
            key: key.into(),
            direction,
        }
    }

    /// Returns the spec that results from clicking `key` while `current`
    /// is active.
    ///
    /// The same key flips direction; a different key starts ascending.
    pub fn toggle(current: Option<&SortSpec>, key: &str) -> SortSpec {
        match current {
            Some(spec) if spec.key == key => SortSpec::new(key, spec.direction.flip()),
            _ => SortSpec::asc(key),
        }
    }

    /// Compares two values under this spec's direction, nulls last.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        SortKey::from_value(a).compare(&SortKey::from_value(b), self.direction)
    }

    /// Compares two records on this spec's field.
    pub fn compare_records<R: Record>(&self, a: &R, b: &R) -> Ordering {
        self.compare(&a.field_value(&self.key), &b.field_value(&self.key))
    }
}

/// Compares two values in ascending order, nulls last.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    SortKey::from_value(a).compare(&SortKey::from_value(b), Dir::Asc)
}

/// Case-insensitive, locale-aware string ordering.
///
/// Strings are compared by their lower-cased, accent-folded form first, so
/// `"émile"` sorts next to `"emile"` rather than after `"zoe"`. Ties are
/// broken on the lower-cased text itself.
pub fn collate(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CollationKey {
    folded: String,
    lower: String,
}

impl CollationKey {
    fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let folded = deunicode::deunicode(&lower).to_lowercase();
        CollationKey { folded, lower }
    }
}

/// Precomputed sort key for one value.
///
/// Variants are declared in rank order. Keys of different variants compare
/// by rank, so the ordering stays total when a column mixes types.
#[derive(Debug, Clone)]
enum SortKey {
    Timestamp(Timestamp),
    Number(Number),
    Text(CollationKey),
    Null,
}

impl SortKey {
    fn from_value(value: &Value<'_>) -> Self {
        if value.is_null() {
            return SortKey::Null;
        }
        if let Some(ts) = value.as_timestamp() {
            return SortKey::Timestamp(ts);
        }
        if let Some(n) = value.as_number() {
            return SortKey::Number(n);
        }
        if let Some(ts) = value.as_str().and_then(Timestamp::parse) {
            return SortKey::Timestamp(ts);
        }
        SortKey::Text(CollationKey::new(value.to_text().as_deref().unwrap_or("")))
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Timestamp(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::Null => 3,
        }
    }

    fn compare(&self, other: &SortKey, dir: Dir) -> Ordering {
        let base = match (self, other) {
            // Nulls last regardless of direction
            (SortKey::Null, SortKey::Null) => return Ordering::Equal,
            (SortKey::Null, _) => return Ordering::Greater,
            (_, SortKey::Null) => return Ordering::Less,

            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => {
                a.compare(*b).unwrap_or(Ordering::Equal)
            }
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        };
        dir.apply(base)
    }
}

/// Sorts `positions` (indices into `records`) by `spec`.
///
/// Returns a new vector; without a spec the input order is kept. The sort
/// is stable, so records with equal keys keep their relative order.
pub fn sort_positions<R: Record>(
    records: &[R],
    positions: &[usize],
    spec: Option<&SortSpec>,
) -> Vec<usize> {
    let Some(spec) = spec else {
        return positions.to_vec();
    };

    let mut keyed: Vec<(usize, SortKey)> = positions
        .iter()
        .map(|&pos| (pos, SortKey::from_value(&records[pos].field_value(&spec.key))))
        .collect();
    keyed.sort_by(|(_, a), (_, b)| a.compare(b, spec.direction));
    keyed.into_iter().map(|(pos, _)| pos).collect()
}

/// Sorts records by `spec` without touching the input.
///
/// ```
/// use sifter::{sort, SortSpec};
/// use serde_json::json;
///
/// let rows = vec![json!({"name": "bob"}), json!({"name": "Ann"}), json!({})];
/// let sorted = sort(&rows, Some(&SortSpec::desc("name")));
/// assert_eq!(sorted[0]["name"], "bob");
/// assert_eq!(sorted[1]["name"], "Ann");
/// assert_eq!(sorted[2], &json!({}));
/// ```
pub fn sort<'a, R: Record>(records: &'a [R], spec: Option<&SortSpec>) -> Vec<&'a R> {
    let all: Vec<usize> = (0..records.len()).collect();
    sort_positions(records, &all, spec)
        .into_iter()
        .map(|pos| &records[pos])
        .collect()
}
