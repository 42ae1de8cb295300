//! The record abstraction the engine queries.
//!
//! Every stage reads records through the [`Record`] trait, so the engine
//! stays generic over the row shape: plain structs, `serde_json` objects,
//! or anything else with named fields.

use serde_json::{Map, Value as Json};

use crate::value::{Number, Value};

/// A row with named fields.
///
/// Implement this for your own row types, or use the provided
/// implementations for `serde_json::Value` and `serde_json::Map`.
///
/// # Manual Implementation
///
/// ```
/// use sifter::{Record, Value, Number};
///
/// struct Workout {
///     title: String,
///     minutes: u32,
/// }
///
/// impl Record for Workout {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "title" => Value::String(&self.title),
///             "minutes" => Value::Number(Number::U64(self.minutes as u64)),
///             _ => Value::None,
///         }
///     }
///
///     fn field_values(&self) -> Vec<(&str, Value<'_>)> {
///         vec![
///             ("title", self.field_value("title")),
///             ("minutes", self.field_value("minutes")),
///         ]
///     }
/// }
/// ```
pub trait Record {
    /// Returns the value of a field, or [`Value::None`] if the field
    /// doesn't exist.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Returns every top-level field with its value.
    ///
    /// Whole-record search walks this list when no searchable fields are
    /// configured.
    fn field_values(&self) -> Vec<(&str, Value<'_>)>;
}

/// Converts a JSON value into a field [`Value`].
pub fn json_value(value: &Json) -> Value<'_> {
    match value {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => json_number(n),
        Json::String(s) => Value::String(s),
        Json::Array(_) | Json::Object(_) => Value::Nested,
    }
}

pub(crate) fn json_number(n: &serde_json::Number) -> Value<'static> {
    if let Some(i) = n.as_i64() {
        Value::Number(Number::I64(i))
    } else if let Some(u) = n.as_u64() {
        Value::Number(Number::U64(u))
    } else {
        n.as_f64()
            .map(|f| Value::Number(Number::F64(f)))
            .unwrap_or(Value::None)
    }
}

/// Looks a field up in a JSON object.
///
/// The literal key wins; otherwise a dotted name is walked as a path into
/// nested objects (`"client.name"`).
fn lookup<'a>(map: &'a Map<String, Json>, field: &str) -> Option<&'a Json> {
    if let Some(value) = map.get(field) {
        return Some(value);
    }
    if !field.contains('.') {
        return None;
    }
    let mut segments = field.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

impl Record for Map<String, Json> {
    fn field_value(&self, field: &str) -> Value<'_> {
        lookup(self, field).map(json_value).unwrap_or(Value::None)
    }

    fn field_values(&self) -> Vec<(&str, Value<'_>)> {
        self.iter()
            .map(|(key, value)| (key.as_str(), json_value(value)))
            .collect()
    }
}

impl Record for Json {
    fn field_value(&self, field: &str) -> Value<'_> {
        match self {
            Json::Object(map) => map.field_value(field),
            _ => Value::None,
        }
    }

    fn field_values(&self) -> Vec<(&str, Value<'_>)> {
        match self {
            Json::Object(map) => map.field_values(),
            _ => Vec::new(),
        }
    }
}
