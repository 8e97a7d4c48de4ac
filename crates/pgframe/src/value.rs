//! Scalar cell values and their SQL literal rendering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

/// A single cell of a [`DataFrame`](crate::DataFrame).
///
/// Literal rendering follows three rules:
/// - missing values (`Null`, or a NaN float) render as unquoted `NULL`
/// - numbers (`Int`, finite `Float`, `Numeric`) render unquoted
/// - everything else renders as a single-quoted string, without escaping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// Whether the value counts as missing.
    ///
    /// A NaN float is missing, matching how dataframes mark absent numbers.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Whether the value renders as an unquoted numeric literal.
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Int(_) | Value::Numeric(_) => true,
            Value::Float(f) => f.is_finite(),
            _ => false,
        }
    }

    /// Whether the injection guard inspects this value.
    ///
    /// JSON documents are interpolated as quoted text, so they are scanned
    /// like strings.
    pub fn is_scanned(&self) -> bool {
        matches!(self, Value::Text(_) | Value::Json(_))
    }

    /// Borrow the string payload of a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short type label, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Numeric(_) => "numeric",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }

    /// The unquoted textual form of the value.
    pub fn raw_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("NULL"),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Value::Int(i) => Cow::Owned(i.to_string()),
            Value::Float(f) if f.is_nan() => Cow::Borrowed("NULL"),
            Value::Float(f) if f.is_infinite() => {
                Cow::Borrowed(if *f > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(f) => Cow::Owned(f.to_string()),
            Value::Numeric(d) => Cow::Owned(d.to_string()),
            Value::Text(s) => Cow::Borrowed(s),
            Value::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => Cow::Owned(t.format("%H:%M:%S%.f").to_string()),
            Value::Timestamp(ts) => Cow::Owned(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::TimestampTz(ts) => Cow::Owned(ts.to_rfc3339()),
            Value::Uuid(u) => Cow::Owned(u.to_string()),
            Value::Json(j) => Cow::Owned(j.to_string()),
        }
    }

    /// Render the value as a SQL literal.
    pub fn to_sql_literal(&self) -> String {
        if self.is_null() {
            "NULL".to_string()
        } else if self.is_numeric() {
            self.raw_text().into_owned()
        } else {
            format!("'{}'", self.raw_text())
        }
    }

    /// Convert a JSON scalar into a cell value.
    ///
    /// Integers that fit `i64` become `Int` and larger unsigned ones `Numeric`,
    /// so they keep every digit. Other numbers become `Float`; arrays and
    /// objects are kept as `Json`.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Numeric(Decimal::from(u))
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_text())
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float,
    Decimal => Numeric,
    String => Text,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Uuid => Uuid,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
