//! Heuristic SQL injection guard.
//!
//! Values are interpolated into statement text as literals, so every string
//! that reaches the writer goes through [`InjectionGuard::check`] first.
//!
//! The rule: after uppercasing and dropping whitespace, a string is rejected
//! when it contains a `'` and the text from that first `'` onwards holds
//! both a `)` and a `;`. That is the shape of the classic
//! `x'); DROP TABLE ...;` payload. It is a heuristic, not a parser: benign
//! text with all three tokens in that order is rejected too, and payloads of
//! any other shape pass.

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// Scans values before they are interpolated into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionGuard {
    enabled: bool,
}

impl Default for InjectionGuard {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl InjectionGuard {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A guard that lets everything through.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check a cell value headed for `column`.
    ///
    /// Only text-like values are scanned; null, numbers, booleans and
    /// date/time values always pass.
    pub fn check(&self, value: &Value, column: &str) -> DbResult<()> {
        if !self.enabled || !value.is_scanned() {
            return Ok(());
        }
        self.check_str(&value.raw_text(), column)
    }

    /// Check raw text (cell contents or a column name).
    pub fn check_str(&self, text: &str, column: &str) -> DbResult<()> {
        if self.enabled && looks_like_injection(text) {
            tracing::warn!(
                target: "pgframe.guard",
                column,
                value = text,
                "possible SQL injection rejected"
            );
            return Err(DbError::injection(column, text));
        }
        Ok(())
    }
}

/// Check `value` for `column` with the guard switched on or off.
pub fn check_value(value: &Value, column: &str, enabled: bool) -> DbResult<()> {
    InjectionGuard::new(enabled).check(value, column)
}

fn looks_like_injection(text: &str) -> bool {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();

    match normalized.find('\'') {
        Some(pos) => {
            let tail = &normalized[pos..];
            tail.contains(')') && tail.contains(';')
        }
        None => false,
    }
}
