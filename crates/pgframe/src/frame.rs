//! In-memory tabular data.
//!
//! A [`DataFrame`] is an ordered list of named columns of equal length. Column
//! order and row order are insertion order, and the statement writer walks
//! them in that order, so the generated SQL is deterministic.
//!
//! # Example
//! ```ignore
//! use pgframe::DataFrame;
//!
//! let cars = DataFrame::new()
//!     .with_column("id", [1, 2])?
//!     .with_column("name", ["Mercedes", "Toyota"])?;
//! assert_eq!(cars.n_rows(), 2);
//! # Ok::<(), pgframe::DbError>(())
//! ```

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// One named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Ordered, named columns with the same number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    /// Create a frame with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder form).
    pub fn with_column<I, V>(mut self, name: &str, values: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_column(name, values)?;
        Ok(self)
    }

    /// Append a column.
    ///
    /// Fails if the name is already taken or the length differs from the
    /// existing columns.
    pub fn push_column<I, V>(&mut self, name: &str, values: I) -> DbResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if self.column(name).is_some() {
            return Err(DbError::frame(format!("duplicate column '{name}'")));
        }
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if !self.columns.is_empty() && values.len() != self.n_rows() {
            return Err(DbError::frame(format!(
                "column '{name}' has {} rows, expected {}",
                values.len(),
                self.n_rows()
            )));
        }
        self.columns.push(Column {
            name: name.to_string(),
            values,
        });
        Ok(())
    }

    /// Build a frame from column names and row tuples.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Value>>) -> DbResult<Self> {
        let mut frame = Self::new();
        for name in names {
            frame.push_column(name.as_ref(), Vec::<Value>::new())?;
        }
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    /// Append one row; its length must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> DbResult<()> {
        if row.len() != self.columns.len() {
            return Err(DbError::frame(format!(
                "row has {} values, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        for (col, value) in self.columns.iter_mut().zip(row) {
            col.values.push(value);
        }
        Ok(())
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value at (`row`, column index).
    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.columns.get(col).and_then(|c| c.values.get(row))
    }

    /// Values of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.n_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Iterate rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.n_rows()).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }

    /// A new frame with only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> DbResult<Self> {
        let mut out = Self::new();
        for name in names {
            let col = self
                .column(name)
                .ok_or_else(|| DbError::UnknownColumn((*name).to_string()))?;
            out.push_column(&col.name, col.values.clone())?;
        }
        Ok(out)
    }

    /// Rows rendered as text and sorted, for comparisons where row order
    /// does not matter (e.g. results of a `SELECT` without `ORDER BY`).
    pub fn sorted_rows(&self) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = self
            .rows()
            .map(|r| r.into_iter().map(|v| v.raw_text().into_owned()).collect())
            .collect();
        rows.sort();
        rows
    }

    /// Build a frame from a JSON array of objects.
    ///
    /// Columns are taken from the first object's keys, in document order.
    /// Every object must carry exactly those keys.
    pub fn from_json_records(json: serde_json::Value) -> DbResult<Self> {
        let serde_json::Value::Array(records) = json else {
            return Err(DbError::frame("expected a JSON array of objects"));
        };

        let mut frame = Self::new();
        for (idx, record) in records.into_iter().enumerate() {
            let serde_json::Value::Object(map) = record else {
                return Err(DbError::frame(format!("record {idx} is not an object")));
            };
            if idx == 0 {
                for key in map.keys() {
                    frame.push_column(key, Vec::<Value>::new())?;
                }
            }
            if map.len() != frame.n_cols() {
                return Err(DbError::frame(format!(
                    "record {idx} has {} fields, expected {}",
                    map.len(),
                    frame.n_cols()
                )));
            }
            let mut row = Vec::with_capacity(frame.n_cols());
            for col in &frame.columns {
                let value = map.get(&col.name).cloned().ok_or_else(|| {
                    DbError::frame(format!("record {idx} is missing field '{}'", col.name))
                })?;
                row.push(Value::from_json(value));
            }
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    /// Serialize rows as a JSON array of objects.
    pub fn to_json_records(&self) -> serde_json::Value {
        let records = self
            .rows()
            .map(|row| {
                let mut map = serde_json::Map::with_capacity(self.n_cols());
                for (col, value) in self.columns.iter().zip(row) {
                    let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                    map.insert(col.name.clone(), json);
                }
                serde_json::Value::Object(map)
            })
            .collect();
        serde_json::Value::Array(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cars() -> DataFrame {
        DataFrame::new()
            .with_column("id", [1, 2, 3])
            .and_then(|f| f.with_column("name", ["Mercedes", "Toyota", "Suzuki"]))
            .unwrap()
    }

    #[test]
    fn shape_and_order() {
        let f = cars();
        assert_eq!(f.n_rows(), 3);
        assert_eq!(f.n_cols(), 2);
        assert_eq!(f.column_names(), vec!["id", "name"]);
        assert_eq!(f.cell(1, 1), Some(&Value::from("Toyota")));
        assert_eq!(f.row(2).unwrap(), vec![&Value::Int(3), &Value::from("Suzuki")]);
        assert!(f.row(3).is_none());
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = cars().with_column("activated", [true]).unwrap_err();
        assert!(matches!(err, DbError::Frame(_)));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = cars().with_column("id", [7, 8, 9]).unwrap_err();
        assert!(err.to_string().contains("duplicate column 'id'"));
    }

    #[test]
    fn columns_without_rows_are_empty() {
        let f = DataFrame::from_rows(&["id", "name"], Vec::new()).unwrap();
        assert_eq!(f.n_cols(), 2);
        assert!(f.is_empty());
    }

    #[test]
    fn push_row_checks_width() {
        let mut f = cars();
        assert!(f.push_row(vec![Value::Int(4)]).is_err());
        f.push_row(vec![Value::Int(4), Value::from("BMW")]).unwrap();
        assert_eq!(f.n_rows(), 4);
    }

    #[test]
    fn select_reorders_columns() {
        let f = cars().select(&["name", "id"]).unwrap();
        assert_eq!(f.column_names(), vec!["name", "id"]);
        assert!(matches!(cars().select(&["nope"]), Err(DbError::UnknownColumn(_))));
    }

    #[test]
    fn sorted_rows_ignores_order() {
        let a = DataFrame::from_rows(&["id"], vec![vec![Value::Int(2)], vec![Value::Int(1)]]).unwrap();
        let b = DataFrame::from_rows(&["id"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.sorted_rows(), b.sorted_rows());
    }

    #[test]
    fn json_records_keep_key_order() {
        let json = serde_json::json!([
            {"name": "Ford", "id": 1, "activated": false},
            {"name": null, "id": 2, "activated": true}
        ]);
        let f = DataFrame::from_json_records(json.clone()).unwrap();
        assert_eq!(f.column_names(), vec!["name", "id", "activated"]);
        assert_eq!(f.cell(1, 0), Some(&Value::Null));
        assert_eq!(f.to_json_records(), json);
    }

    #[test]
    fn json_records_must_share_fields() {
        let json = serde_json::json!([{"id": 1}, {"id": 2, "extra": 3}]);
        assert!(DataFrame::from_json_records(json).is_err());
        assert!(DataFrame::from_json_records(serde_json::json!({"id": 1})).is_err());
    }
}
