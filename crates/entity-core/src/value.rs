//! Value representations carried by an [`Entity`].
//!
//! `EntityValue` is a closed set of shapes. Codecs match on it exhaustively, so a
//! shape a target format cannot hold is always an explicit error at the match
//! site rather than a silent fallthrough.

use crate::entity::Entity;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt;

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
    /// Absent value
    Null,

    /// Text value
    String(String),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Double(f64),

    /// Boolean value
    Boolean(bool),

    /// Named member of an enumeration, e.g. `TextCase.Upper`
    Enumeration {
        /// Enumeration type name
        kind: String,
        /// Member name
        value: String,
    },

    /// Date/time, normalised to UTC
    DateTime(DateTime<Utc>),

    /// Record nested inside a property
    NestedEntity(Entity),

    /// Ordered sequence of values
    NestedList(Vec<EntityValue>),
}

/// Scalar kind a consumer may request from textual input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
    /// Members of the named enumeration type
    Enumeration(String),
}

impl EntityValue {
    /// Create an enumeration value.
    pub fn enumeration(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Enumeration {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is a scalar (neither nested entity nor nested list).
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::NestedEntity(_) | Self::NestedList(_))
    }

    /// Short description of the value's shape, used in error reports.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::Enumeration { .. } => "enumeration",
            Self::DateTime(_) => "date-time",
            Self::NestedEntity(_) => "nested entity",
            Self::NestedList(_) => "nested list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to doubles.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::NestedEntity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[EntityValue]> {
        match self {
            Self::NestedList(l) => Some(l),
            _ => None,
        }
    }

    /// Resolve this value to the most specific value of the requested kind.
    ///
    /// Textual values are parsed; text that does not parse as `kind` is returned
    /// unchanged as a string. Non-textual values are returned as they are, except
    /// that integers widen when a double is requested.
    pub fn best_value(&self, kind: &ValueKind) -> EntityValue {
        match (self, kind) {
            (Self::String(s), kind) => parse_as(s, kind).unwrap_or_else(|| self.clone()),
            (Self::Integer(i), ValueKind::Double) => Self::Double(*i as f64),
            _ => self.clone(),
        }
    }

    /// Infer the most specific scalar for a piece of text.
    ///
    /// Tries boolean, integer, double and date-time in that order, falling back
    /// to a string.
    pub fn infer(text: &str) -> EntityValue {
        [
            ValueKind::Boolean,
            ValueKind::Integer,
            ValueKind::Double,
            ValueKind::DateTime,
        ]
        .iter()
        .find_map(|kind| parse_as(text, kind))
        .unwrap_or_else(|| Self::String(text.to_string()))
    }
}

fn parse_as(text: &str, kind: &ValueKind) -> Option<EntityValue> {
    let trimmed = text.trim();
    match kind {
        ValueKind::String => Some(EntityValue::String(text.to_string())),
        ValueKind::Integer => trimmed.parse::<i64>().ok().map(EntityValue::Integer),
        ValueKind::Double => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && trimmed.bytes().any(|b| b.is_ascii_digit()))
            .map(EntityValue::Double),
        ValueKind::Boolean => parse_bool(trimmed).map(EntityValue::Boolean),
        ValueKind::DateTime => parse_datetime_string(trimmed).map(EntityValue::DateTime),
        ValueKind::Enumeration(name) => {
            if trimmed.is_empty() {
                None
            } else {
                Some(EntityValue::enumeration(name.clone(), trimmed))
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse a date-time string in the formats commonly found in exports.
///
/// Supports:
/// - RFC 3339: "2024-01-01T12:00:00Z"
/// - Space separated: "2024-01-01 12:00:00"
/// - Space separated with fractional seconds: "2024-01-01 12:00:00.123456"
/// - Date only: "2024-01-01" (midnight UTC)
pub fn parse_datetime_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Enumeration { kind, value } => write!(f, "{kind}.{value}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::NestedEntity(e) => write!(f, "{e}"),
            Self::NestedList(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<String> for EntityValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for EntityValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for EntityValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for EntityValue {
    fn from(i: i32) -> Self {
        Self::Integer(i as i64)
    }
}

impl From<f64> for EntityValue {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<bool> for EntityValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for EntityValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Entity> for EntityValue {
    fn from(e: Entity) -> Self {
        Self::NestedEntity(e)
    }
}

impl<T: Into<EntityValue>> From<Vec<T>> for EntityValue {
    fn from(items: Vec<T>) -> Self {
        Self::NestedList(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<EntityValue>> From<Option<T>> for EntityValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}
