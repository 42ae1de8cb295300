//! Runtime value types for field comparison.
//!
//! The [`Value`] enum represents the value of one field read from a record.
//! It covers the scalar shapes list views deal with (strings, numbers,
//! timestamps, booleans) plus markers for nested data and absent fields.
//!
//! The coercion helpers on [`Value`] are total: a value that cannot be
//! turned into text, a number or a timestamp yields `None` rather than an
//! error, and the stages treat that as "no match" or "sorts last".

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Runtime value for comparison, borrowed from the source record.
///
/// # Example
///
/// ```
/// use sifter::{Value, Number};
///
/// struct Meal {
///     name: String,
///     calories: u32,
/// }
///
/// fn field<'a>(meal: &'a Meal, field: &str) -> Value<'a> {
///     match field {
///         "name" => Value::String(&meal.name),
///         "calories" => Value::Number(Number::U64(meal.calories as u64)),
///         _ => Value::None,
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// Object or array. Present, but not a scalar.
    Nested,
    /// Field not present or null.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` for values the sort stage treats as null.
    ///
    /// Besides [`Value::None`], a NaN number has no position in a numeric
    /// ordering and is grouped with the nulls.
    pub fn is_null(&self) -> bool {
        match self {
            Value::None => true,
            Value::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Returns `true` for strings and numbers, the fields whole-record
    /// search looks at.
    pub fn is_searchable_scalar(&self) -> bool {
        matches!(self, Value::String(_) | Value::Number(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the timestamp value, if present.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Coerces a scalar to its text form.
    ///
    /// Timestamps render as RFC 3339. Nested and absent values have no
    /// text form.
    pub fn to_text(&self) -> Option<Cow<'a, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(*s)),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Timestamp(t) => t.to_rfc3339().map(Cow::Owned),
            Value::Nested | Value::None => None,
        }
    }

    /// Coerces the value to a number.
    ///
    /// Numeric strings are parsed, booleans map to `1`/`0`. Anything else,
    /// including blank strings, is not a number.
    pub fn to_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            Value::String(s) => Number::parse(s),
            Value::Bool(b) => Some(Number::I64(i64::from(*b))),
            _ => None,
        }
    }

    /// Coerces the value to a timestamp.
    ///
    /// Numbers are read as epoch milliseconds, strings are parsed with
    /// [`Timestamp::parse`].
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            Value::String(s) => Timestamp::parse(s),
            Value::Number(n) if n.to_f64().is_finite() => {
                Some(Timestamp::from_millis(n.to_f64() as i64))
            }
            _ => None,
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
///
/// Comparisons between different numeric types are handled by converting
/// to the appropriate common type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Returns `true` if this is a NaN float.
    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(n) if n.is_nan())
    }

    /// Compares two numbers by exact value, across variants.
    ///
    /// Integers are never rounded through `f64`, so the ordering is
    /// transitive over every non-NaN number. Returns `None` only for NaN.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self.integer(), other.integer()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (Some(a), None) => compare_integer_float(a, other.to_f64()),
            (None, Some(b)) => compare_integer_float(b, self.to_f64()).map(Ordering::reverse),
            (None, None) => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    fn integer(self) -> Option<i128> {
        match self {
            Number::I64(n) => Some(i128::from(n)),
            Number::U64(n) => Some(i128::from(n)),
            Number::F64(_) => None,
        }
    }

    /// Returns `true` if both numbers denote the same quantity.
    pub fn numeric_eq(self, other: Number) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Parses a number from text, ignoring surrounding whitespace.
    ///
    /// Integers keep their integer representation. Blank input and NaN
    /// are rejected.
    pub fn parse(s: &str) -> Option<Number> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(n) = s.parse::<i64>() {
            return Some(Number::I64(n));
        }
        if let Ok(n) = s.parse::<u64>() {
            return Some(Number::U64(n));
        }
        match s.parse::<f64>() {
            Ok(n) if !n.is_nan() => Some(Number::F64(n)),
            _ => None,
        }
    }
}

// Rounding to f64 is monotone, so a strict float ordering is exact. On a
// tie the float is integral and within i128, and the exact values decide.
fn compare_integer_float(a: i128, b: f64) -> Option<Ordering> {
    match (a as f64).partial_cmp(&b)? {
        Ordering::Equal => Some(a.cmp(&(b as i128))),
        ordering => Some(ordering),
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{}", n),
            Number::U64(n) => write!(f, "{}", n),
            Number::F64(n) => write!(f, "{}", n),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// Calendar-day operations are performed in UTC.
///
/// ```
/// use sifter::Timestamp;
///
/// let a = Timestamp::parse("2024-03-01T08:30:00Z").unwrap();
/// let b = Timestamp::parse("2024-03-01").unwrap();
/// assert!(b < a);
/// assert_eq!(a.day(), b.day());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Parses RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` or a
    /// bare `YYYY-MM-DD` date. Offset-less input is read as UTC.
    pub fn parse(s: &str) -> Option<Timestamp> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Timestamp(dt.timestamp_millis()));
        }
        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Timestamp(naive.and_utc().timestamp_millis()));
            }
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Timestamp(naive.and_utc().timestamp_millis()))
    }

    /// Returns the UTC calendar day, or `None` outside chrono's range.
    pub fn day(self) -> Option<NaiveDate> {
        self.to_datetime().map(|dt| dt.date_naive())
    }

    /// Renders the timestamp as RFC 3339 in UTC.
    pub fn to_rfc3339(self) -> Option<String> {
        self.to_datetime().map(|dt| dt.to_rfc3339())
    }

    fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl From<NaiveDate> for Timestamp {
    fn from(date: NaiveDate) -> Self {
        Timestamp(date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_extractors() {
        assert_eq!(Value::String("hello").as_str(), Some("hello"));
        assert_eq!(
            Value::Number(Number::I64(42)).as_number(),
            Some(Number::I64(42))
        );
        assert_eq!(
            Value::Timestamp(Timestamp(1000)).as_timestamp(),
            Some(Timestamp(1000))
        );

        // Wrong type returns None
        assert_eq!(Value::String("test").as_number(), None);
        assert_eq!(Value::Number(Number::I64(1)).as_str(), None);
    }

    #[test]
    fn null_like_values() {
        assert!(Value::None.is_null());
        assert!(Value::Number(Number::F64(f64::NAN)).is_null());
        assert!(!Value::Number(Number::F64(0.0)).is_null());
        assert!(!Value::String("").is_null());
        assert!(!Value::Nested.is_null());
    }

    #[test]
    fn text_coercion() {
        assert_eq!(Value::String("Ann").to_text().as_deref(), Some("Ann"));
        assert_eq!(Value::Number(Number::I64(-3)).to_text().as_deref(), Some("-3"));
        assert_eq!(Value::Number(Number::F64(2.5)).to_text().as_deref(), Some("2.5"));
        assert_eq!(Value::Number(Number::F64(4.0)).to_text().as_deref(), Some("4"));
        assert_eq!(Value::Bool(false).to_text().as_deref(), Some("false"));
        assert_eq!(
            Value::Timestamp(Timestamp(0)).to_text().as_deref(),
            Some("1970-01-01T00:00:00+00:00")
        );
        assert_eq!(Value::Nested.to_text(), None);
        assert_eq!(Value::None.to_text(), None);
    }

    #[test]
    fn number_coercion() {
        assert_eq!(Value::String(" 42 ").to_number(), Some(Number::I64(42)));
        assert_eq!(Value::String("1.5").to_number(), Some(Number::F64(1.5)));
        assert_eq!(Value::String("").to_number(), None);
        assert_eq!(Value::String("abc").to_number(), None);
        assert_eq!(Value::String("NaN").to_number(), None);
        assert_eq!(Value::Bool(true).to_number(), Some(Number::I64(1)));
        assert_eq!(Value::Number(Number::F64(f64::NAN)).to_number(), None);
        assert_eq!(Value::None.to_number(), None);
    }

    #[test]
    fn timestamp_coercion() {
        assert_eq!(
            Value::Number(Number::I64(1500)).to_timestamp(),
            Some(Timestamp(1500))
        );
        assert_eq!(Value::String("not a date").to_timestamp(), None);
        assert_eq!(Value::Bool(true).to_timestamp(), None);
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(5).compare(Number::U64(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(-1).compare(Number::U64(u64::MAX)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::U64(10).compare(Number::I64(3)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Number::I64(5).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
        assert!(Number::U64(7).numeric_eq(Number::F64(7.0)));
    }

    #[test]
    fn integer_float_comparison_is_exact() {
        let big = 1i64 << 53;
        let float = Number::F64(big as f64);
        // big + 1 rounds to big as f64, but is still strictly greater
        assert_eq!(Number::I64(big + 1).compare(float), Some(Ordering::Greater));
        assert_eq!(float.compare(Number::I64(big + 1)), Some(Ordering::Less));
        assert_eq!(Number::I64(big).compare(float), Some(Ordering::Equal));

        assert_eq!(
            Number::U64(u64::MAX).compare(Number::F64(18_446_744_073_709_551_616.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(i64::MIN).compare(Number::F64(f64::NEG_INFINITY)),
            Some(Ordering::Greater)
        );
        assert_eq!(Number::I64(2).compare(Number::F64(2.5)), Some(Ordering::Less));
        assert_eq!(Number::F64(-0.5).compare(Number::I64(0)), Some(Ordering::Less));
    }

    #[test]
    fn number_nan_comparison() {
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
        assert!(!Number::F64(f64::NAN).numeric_eq(Number::F64(f64::NAN)));
    }

    #[test]
    fn number_conversions() {
        assert_eq!(Number::from(42i32), Number::I64(42));
        assert_eq!(Number::from(42u32), Number::U64(42));
        assert_eq!(Number::from(42.5f64), Number::F64(42.5));
    }

    #[test]
    fn timestamp_parse_formats() {
        let day = Timestamp::parse("2024-03-01").unwrap();
        assert_eq!(day.as_millis(), 1_709_251_200_000);

        let utc = Timestamp::parse("2024-03-01T10:15:00Z").unwrap();
        assert_eq!(utc.as_millis() - day.as_millis(), (10 * 3600 + 15 * 60) * 1000);

        let offset = Timestamp::parse("2024-03-01T12:15:00+02:00").unwrap();
        assert_eq!(offset, utc);

        let naive = Timestamp::parse("2024-03-01 10:15:00").unwrap();
        assert_eq!(naive, utc);

        let naive_t = Timestamp::parse("2024-03-01T10:15:00.000").unwrap();
        assert_eq!(naive_t, utc);

        assert_eq!(Timestamp::parse(""), None);
        assert_eq!(Timestamp::parse("2024-13-01"), None);
        assert_eq!(Timestamp::parse("yesterday"), None);
    }

    #[test]
    fn timestamp_day_drops_time() {
        let morning = Timestamp::parse("2024-03-01T00:00:01Z").unwrap();
        let night = Timestamp::parse("2024-03-01T23:59:59Z").unwrap();
        let next = Timestamp::parse("2024-03-02T00:00:00Z").unwrap();
        assert_eq!(morning.day(), night.day());
        assert_ne!(night.day(), next.day());
    }

    #[test]
    fn timestamp_from_chrono() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Timestamp::from(date), Timestamp::parse("2024-03-01").unwrap());
    }
}
