//! SQL statement writer.
//!
//! Turns a [`DataFrame`] into complete INSERT / UPDATE / DELETE text. The
//! writer never touches the database; pass the result to
//! [`Connector::execute`](crate::Connector::execute).
//!
//! Values are interpolated as literals (see [`Value::to_sql_literal`]), and
//! every column name and text cell is run through the [`InjectionGuard`]
//! first. One rejected value aborts the whole statement.
//!
//! # Example
//! ```ignore
//! use pgframe::{DataFrame, SqlWriter};
//!
//! let data = DataFrame::new()
//!     .with_column("id", [1, 2])?
//!     .with_column("name", ["Mercedes", "Toyota"])?;
//!
//! let sql = SqlWriter::new().insert_statement("test.simple", &data, false)?;
//! assert_eq!(
//!     sql,
//!     "INSERT INTO test.simple (id, name) VALUES (1, 'Mercedes'), (2, 'Toyota');"
//! );
//! # Ok::<(), pgframe::DbError>(())
//! ```

use crate::error::{DbError, DbResult};
use crate::frame::DataFrame;
use crate::guard::InjectionGuard;
use crate::value::Value;

/// Builds DML text from tabular data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlWriter {
    guard: InjectionGuard,
}

impl SqlWriter {
    /// Create a writer with the injection guard enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer around an existing guard.
    pub fn with_guard(guard: InjectionGuard) -> Self {
        Self { guard }
    }

    /// Switch the injection guard on or off.
    pub fn guard_enabled(mut self, enabled: bool) -> Self {
        self.guard = InjectionGuard::new(enabled);
        self
    }

    pub fn guard(&self) -> InjectionGuard {
        self.guard
    }

    /// `INSERT INTO <table> (cols) VALUES (row), (row), ...;`
    ///
    /// All rows go into a single statement. With `truncate` the statement is
    /// prefixed with `TRUNCATE TABLE <table>; `.
    pub fn insert_statement(
        &self,
        table: &str,
        data: &DataFrame,
        truncate: bool,
    ) -> DbResult<String> {
        ensure_rows(table, data, "INSERT")?;

        let columns = data.column_names();
        for col in &columns {
            self.guard.check_str(col, col)?;
        }

        let mut tuples = Vec::with_capacity(data.n_rows());
        for row in data.rows() {
            let mut literals = Vec::with_capacity(columns.len());
            for (col, value) in columns.iter().zip(row) {
                literals.push(self.literal(value, col)?);
            }
            tuples.push(format!("({})", literals.join(", ")));
        }

        let mut sql = String::new();
        if truncate {
            sql.push_str(&format!("TRUNCATE TABLE {table}; "));
        }
        sql.push_str(&format!(
            "INSERT INTO {table} ({}) VALUES {};",
            columns.join(", "),
            tuples.join(", ")
        ));
        Ok(sql)
    }

    /// One `UPDATE <table> SET c = v, ... WHERE k1 = v1 AND k2 = v2;` per row.
    ///
    /// `key_columns` are matched against the data's columns ignoring case;
    /// every other column becomes a SET target. Statements are joined with a
    /// single space so the batch runs in one `execute`.
    pub fn update_statement(
        &self,
        table: &str,
        data: &DataFrame,
        key_columns: &[&str],
    ) -> DbResult<String> {
        ensure_rows(table, data, "UPDATE")?;
        if key_columns.is_empty() {
            return Err(DbError::NoKeyColumns);
        }

        let names = data.column_names();
        let normalized = normalized_names(&names)?;

        let mut key_idx: Vec<usize> = Vec::with_capacity(key_columns.len());
        for key in key_columns {
            let wanted = key.to_lowercase();
            let idx = normalized
                .iter()
                .position(|n| *n == wanted)
                .ok_or_else(|| DbError::UnknownColumn((*key).to_string()))?;
            if key_idx.contains(&idx) {
                return Err(DbError::AmbiguousColumn((*key).to_string()));
            }
            key_idx.push(idx);
        }

        let set_idx: Vec<usize> = (0..names.len()).filter(|i| !key_idx.contains(i)).collect();
        if set_idx.is_empty() {
            return Err(DbError::NoColumnsToUpdate);
        }

        for &i in set_idx.iter().chain(&key_idx) {
            self.guard.check_str(names[i], names[i])?;
        }

        let mut statements = Vec::with_capacity(data.n_rows());
        for row in data.rows() {
            let mut assignments = Vec::with_capacity(set_idx.len());
            for &i in &set_idx {
                assignments.push(format!("{} = {}", names[i], self.literal(row[i], names[i])?));
            }
            let predicates = self.predicates(&names, &row, &key_idx)?;
            statements.push(format!(
                "UPDATE {table} SET {} WHERE {};",
                assignments.join(", "),
                predicates
            ));
        }
        Ok(statements.join(" "))
    }

    /// DELETE rows matching the data.
    ///
    /// - one column: `DELETE FROM <table> WHERE <col> IN (v1, v2, ...);`
    /// - several columns: one `DELETE FROM <table> WHERE c1 = v1 AND ...;`
    ///   per row, joined with a single space
    ///
    /// A NULL renders as `NULL` in both forms and so never matches a row.
    pub fn delete_statement(&self, table: &str, data: &DataFrame) -> DbResult<String> {
        ensure_rows(table, data, "DELETE")?;

        let names = data.column_names();
        for col in &names {
            self.guard.check_str(col, col)?;
        }

        if let [col] = data.columns() {
            let mut literals = Vec::with_capacity(col.values.len());
            for value in &col.values {
                literals.push(self.literal(value, &col.name)?);
            }
            return Ok(format!(
                "DELETE FROM {table} WHERE {} IN ({});",
                col.name,
                literals.join(", ")
            ));
        }

        let all: Vec<usize> = (0..names.len()).collect();
        let mut statements = Vec::with_capacity(data.n_rows());
        for row in data.rows() {
            let predicates = self.predicates(&names, &row, &all)?;
            statements.push(format!("DELETE FROM {table} WHERE {predicates};"));
        }
        Ok(statements.join(" "))
    }

    fn literal(&self, value: &Value, column: &str) -> DbResult<String> {
        self.guard.check(value, column)?;
        Ok(value.to_sql_literal())
    }

    fn predicates(&self, names: &[&str], row: &[&Value], idx: &[usize]) -> DbResult<String> {
        let mut parts = Vec::with_capacity(idx.len());
        for &i in idx {
            parts.push(format!("{} = {}", names[i], self.literal(row[i], names[i])?));
        }
        Ok(parts.join(" AND "))
    }
}

fn ensure_rows(table: &str, data: &DataFrame, verb: &str) -> DbResult<()> {
    if data.is_empty() {
        tracing::warn!(
            target: "pgframe.writer",
            table,
            columns = data.n_cols(),
            "{verb} skipped: no rows"
        );
        return Err(DbError::empty_input(format!(
            "{verb} on {table} needs at least one row"
        )));
    }
    Ok(())
}

/// Lowercased column names; two names that collide once lowercased are an error.
fn normalized_names(names: &[&str]) -> DbResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let lower = name.to_lowercase();
        if out.contains(&lower) {
            return Err(DbError::AmbiguousColumn((*name).to_string()));
        }
        out.push(lower);
    }
    Ok(out)
}
