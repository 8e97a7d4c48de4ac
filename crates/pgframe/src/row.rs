//! Result-set materialization: `tokio_postgres::Row` → [`Value`] cells.
//!
//! Two paths lead to a frame. When every result column has a type listed in
//! [`decodes_binary`], rows are read through the binary protocol and decoded
//! into typed values ([`frame_from_rows`]). Anything else (intervals,
//! network types, ranges, arrays of other element types, ...) is read in the
//! server's text form ([`frame_from_text_rows`]), keeping typed values for
//! the columns whose text parses back.

use crate::error::{DbError, DbResult};
use crate::frame::DataFrame;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write as _;
use tokio_postgres::types::{FromSql, Kind, Type};
use tokio_postgres::{Row, SimpleQueryRow};

const TEXT_TYPES: &[Type] = &[Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN];

const SCALAR_TYPES: &[Type] = &[
    Type::BOOL,
    Type::INT2,
    Type::INT4,
    Type::INT8,
    Type::OID,
    Type::FLOAT4,
    Type::FLOAT8,
    Type::NUMERIC,
    Type::DATE,
    Type::TIME,
    Type::TIMESTAMP,
    Type::TIMESTAMPTZ,
    Type::UUID,
    Type::JSON,
    Type::JSONB,
    Type::BYTEA,
];

/// Array element types decoded into a JSON array.
const ARRAY_ELEMENT_TYPES: &[Type] = &[
    Type::BOOL,
    Type::INT2,
    Type::INT4,
    Type::INT8,
    Type::FLOAT4,
    Type::FLOAT8,
    Type::TEXT,
    Type::VARCHAR,
    Type::BPCHAR,
    Type::NAME,
];

/// Whether values of `ty` can be decoded from the binary protocol.
pub fn decodes_binary(ty: &Type) -> bool {
    if TEXT_TYPES.contains(ty) || SCALAR_TYPES.contains(ty) {
        return true;
    }
    match ty.kind() {
        Kind::Array(elem) => ARRAY_ELEMENT_TYPES.contains(elem),
        _ => false,
    }
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning DbError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Decode the cell at `idx` into a [`Value`], picking the variant from
    /// the column's PostgreSQL type.
    fn value_at(&self, idx: usize) -> DbResult<Value>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| DbError::decode(column, e.to_string()))
    }

    fn value_at(&self, idx: usize) -> DbResult<Value> {
        let column = &self.columns()[idx];
        let name = column.name();
        let ty = column.type_();

        let value = if *ty == Type::BOOL {
            get::<bool>(self, idx, name)?.map(Value::Bool)
        } else if *ty == Type::INT2 {
            get::<i16>(self, idx, name)?.map(Value::from)
        } else if *ty == Type::INT4 {
            get::<i32>(self, idx, name)?.map(Value::from)
        } else if *ty == Type::INT8 {
            get::<i64>(self, idx, name)?.map(Value::Int)
        } else if *ty == Type::OID {
            get::<u32>(self, idx, name)?.map(Value::from)
        } else if *ty == Type::FLOAT4 {
            get::<f32>(self, idx, name)?.map(Value::from)
        } else if *ty == Type::FLOAT8 {
            get::<f64>(self, idx, name)?.map(Value::Float)
        } else if *ty == Type::NUMERIC {
            get::<Decimal>(self, idx, name)?.map(Value::Numeric)
        } else if TEXT_TYPES.contains(ty) {
            get::<String>(self, idx, name)?.map(Value::Text)
        } else if *ty == Type::DATE {
            get::<NaiveDate>(self, idx, name)?.map(Value::Date)
        } else if *ty == Type::TIME {
            get::<NaiveTime>(self, idx, name)?.map(Value::Time)
        } else if *ty == Type::TIMESTAMP {
            get::<NaiveDateTime>(self, idx, name)?.map(Value::Timestamp)
        } else if *ty == Type::TIMESTAMPTZ {
            get::<DateTime<Utc>>(self, idx, name)?.map(Value::TimestampTz)
        } else if *ty == Type::UUID {
            get::<uuid::Uuid>(self, idx, name)?.map(Value::Uuid)
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            get::<serde_json::Value>(self, idx, name)?.map(Value::Json)
        } else if *ty == Type::BYTEA {
            get::<Vec<u8>>(self, idx, name)?.map(|bytes| Value::Text(bytea_hex(&bytes)))
        } else if let Kind::Array(elem) = ty.kind() {
            array_at(self, idx, name, elem)?
        } else {
            return Err(DbError::decode(
                name,
                format!("type '{ty}' has no binary decoding; read it as text"),
            ));
        };
        Ok(value.unwrap_or(Value::Null))
    }
}

fn get<'r, T>(row: &'r Row, idx: usize, name: &str) -> DbResult<Option<T>>
where
    T: FromSql<'r>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| DbError::decode(name, e.to_string()))
}

fn array_at(row: &Row, idx: usize, name: &str, elem: &Type) -> DbResult<Option<Value>> {
    fn json<'r, T>(row: &'r Row, idx: usize, name: &str) -> DbResult<Option<Value>>
    where
        T: FromSql<'r> + Serialize,
    {
        get::<Vec<Option<T>>>(row, idx, name)?
            .map(|items| {
                serde_json::to_value(items)
                    .map(Value::Json)
                    .map_err(|e| DbError::decode(name, e.to_string()))
            })
            .transpose()
    }

    if *elem == Type::BOOL {
        json::<bool>(row, idx, name)
    } else if *elem == Type::INT2 {
        json::<i16>(row, idx, name)
    } else if *elem == Type::INT4 {
        json::<i32>(row, idx, name)
    } else if *elem == Type::INT8 {
        json::<i64>(row, idx, name)
    } else if *elem == Type::FLOAT4 {
        json::<f32>(row, idx, name)
    } else if *elem == Type::FLOAT8 {
        json::<f64>(row, idx, name)
    } else if TEXT_TYPES.contains(elem) {
        json::<String>(row, idx, name)
    } else {
        Err(DbError::decode(
            name,
            format!("arrays of '{elem}' have no binary decoding; read them as text"),
        ))
    }
}

/// PostgreSQL's hex output format for `bytea`: `\x` followed by two hex
/// digits per byte.
fn bytea_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Parse one cell of a text-format result into a [`Value`].
///
/// Types with a typed variant are parsed back into it; anything else, or
/// text that does not parse, is kept verbatim as `Text`.
pub fn text_value(ty: &Type, text: Option<&str>) -> Value {
    let Some(s) = text else {
        return Value::Null;
    };
    let parsed = if *ty == Type::BOOL {
        match s {
            "t" => Some(Value::Bool(true)),
            "f" => Some(Value::Bool(false)),
            _ => None,
        }
    } else if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 || *ty == Type::OID {
        s.parse::<i64>().ok().map(Value::Int)
    } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
        s.parse::<f64>().ok().map(Value::Float)
    } else if *ty == Type::NUMERIC {
        s.parse::<Decimal>().ok().map(Value::Numeric)
    } else if *ty == Type::DATE {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Value::Date)
    } else if *ty == Type::TIME {
        NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok().map(Value::Time)
    } else if *ty == Type::TIMESTAMP {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(Value::Timestamp)
    } else if *ty == Type::TIMESTAMPTZ {
        DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z")
            .ok()
            .map(|ts| Value::TimestampTz(ts.with_timezone(&Utc)))
    } else if *ty == Type::UUID {
        s.parse::<uuid::Uuid>().ok().map(Value::Uuid)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        serde_json::from_str(s).ok().map(Value::Json)
    } else {
        None
    };
    parsed.unwrap_or_else(|| Value::Text(s.to_string()))
}

/// Collect a full result set into a frame.
///
/// Column names come from the statement, so a query returning no rows still
/// yields a frame with the right columns. Repeated names (`SELECT a.id, b.id`)
/// get a `.1`, `.2`, ... suffix.
pub fn frame_from_rows(columns: &[tokio_postgres::Column], rows: &[Row]) -> DbResult<DataFrame> {
    let mut frame = empty_frame(columns)?;
    for row in rows {
        let values = (0..row.len())
            .map(|idx| row.value_at(idx))
            .collect::<DbResult<Vec<_>>>()?;
        frame.push_row(values)?;
    }
    Ok(frame)
}

/// Collect a text-format (simple query) result set into a frame.
///
/// `columns` is the prepared statement's metadata for the same query and
/// supplies names and types.
pub fn frame_from_text_rows(
    columns: &[tokio_postgres::Column],
    rows: &[SimpleQueryRow],
) -> DbResult<DataFrame> {
    let mut frame = empty_frame(columns)?;
    for row in rows {
        if row.len() != columns.len() {
            return Err(DbError::frame(format!(
                "text result has {} columns, statement describes {}",
                row.len(),
                columns.len()
            )));
        }
        let values = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| text_value(col.type_(), row.get(idx)))
            .collect();
        frame.push_row(values)?;
    }
    Ok(frame)
}

fn empty_frame(columns: &[tokio_postgres::Column]) -> DbResult<DataFrame> {
    let names = unique_names(columns.iter().map(|c| c.name()));
    DataFrame::from_rows(&names, Vec::new())
}

fn unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let mut candidate = name.to_string();
        let mut n = 0;
        while out.contains(&candidate) {
            n += 1;
            candidate = format!("{name}.{n}");
        }
        out.push(candidate);
    }
    out
}
