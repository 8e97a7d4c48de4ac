//! Error types for pgframe

use thiserror::Error;

/// Result type alias for pgframe operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for statement building and database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution or query error
    #[error("Statement error: {0}")]
    Statement(#[from] tokio_postgres::Error),

    /// A value looks like an attempt at SQL injection
    #[error(
        "A possible intent of SQL Injection has been found on field: '{column}'. \
         Operation interrupted. Problematic value: '{value}'"
    )]
    InjectionSuspected { column: String, value: String },

    /// Nothing to write
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Every column of an UPDATE is a key column
    #[error("No columns to update: every column is a key column")]
    NoColumnsToUpdate,

    /// UPDATE without key columns would rewrite the whole table
    #[error("No key columns given for UPDATE")]
    NoKeyColumns,

    /// A named column is not present in the data
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Two columns collide once case is ignored
    #[error("Ambiguous column after case normalization: {0}")]
    AmbiguousColumn(String),

    /// The factory does not know this vendor
    #[error("Unsupported vendor: {0}")]
    UnsupportedVendor(String),

    /// Invalid or incomplete connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// TLS setup error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Malformed tabular data
    #[error("Frame error: {0}")]
    Frame(String),

    /// Result decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an injection error for a column/value pair
    pub fn injection(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InjectionSuspected {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Create an empty input error
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a frame error
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame(message.into())
    }

    /// Check if the guard rejected a value
    pub fn is_injection_suspected(&self) -> bool {
        matches!(self, Self::InjectionSuspected { .. })
    }

    /// Check if this is an empty input error
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput(_))
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if the error was raised before any database interaction
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InjectionSuspected { .. }
                | Self::EmptyInput(_)
                | Self::NoColumnsToUpdate
                | Self::NoKeyColumns
                | Self::UnknownColumn(_)
                | Self::AmbiguousColumn(_)
                | Self::Frame(_)
        )
    }

    /// SQLSTATE code of a database-side statement failure, if any
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Statement(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injection_message_names_column_and_value() {
        let err = DbError::injection("my_col", "',''); DROP DATABASE; ");
        assert_eq!(
            err.to_string(),
            "A possible intent of SQL Injection has been found on field: 'my_col'. \
             Operation interrupted. Problematic value: '',''); DROP DATABASE; '"
        );
        assert!(err.is_injection_suspected());
        assert!(err.is_validation());
    }

    #[test]
    fn connection_errors_are_not_validation() {
        let err = DbError::Connection("refused".to_string());
        assert!(err.is_connection());
        assert!(!err.is_validation());
        assert_eq!(err.sql_state(), None);
    }
}
