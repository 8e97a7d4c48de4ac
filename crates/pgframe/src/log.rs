//! SQL logging via `tracing`.
//!
//! Statements are emitted at DEBUG on the `pgframe.sql` target before they
//! run. Long statements (a multi-row INSERT easily reaches megabytes) are
//! cut at [`MAX_LOGGED_SQL`] bytes.

/// Byte limit for logged SQL text.
pub const MAX_LOGGED_SQL: usize = 200;

/// Which connector operation ran the SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlKind {
    Query,
    Execute,
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

pub(crate) fn log_sql(kind: SqlKind, sql: &str) {
    if sql.len() > MAX_LOGGED_SQL {
        tracing::debug!(
            target: "pgframe.sql",
            kind = ?kind,
            len = sql.len(),
            "{}...",
            truncate_sql_bytes(sql, MAX_LOGGED_SQL)
        );
    } else {
        tracing::debug!(target: "pgframe.sql", kind = ?kind, "{sql}");
    }
}

pub(crate) fn log_sql_error(kind: SqlKind, err: &crate::DbError) {
    tracing::debug!(target: "pgframe.sql", kind = ?kind, error = %err, "statement failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        // 'é' is two bytes; cutting inside it backs off to the boundary.
        assert_eq!(truncate_sql_bytes("'é'", 2), "'");
    }
}
