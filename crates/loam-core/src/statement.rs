//! Compiled SQL text with its ordered bindings.

use serde::Serialize;

use crate::error::{CompileError, Result};
use crate::value::SqlValue;

/// The output of every grammar: SQL text plus positional bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Values for the placeholders, in text order.
    pub bindings: Vec<SqlValue>,
}

impl CompiledStatement {
    /// Creates a statement.
    #[must_use]
    pub fn new(sql: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// Creates a statement without bindings.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Number of `?` placeholders outside quoted literals and identifiers.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// Checks that placeholders and bindings line up.
    pub fn validate(&self) -> Result<()> {
        validate(&self.sql, &self.bindings)
    }
}

/// Fails when the placeholder count of `sql` differs from `bindings.len()`.
pub fn validate(sql: &str, bindings: &[SqlValue]) -> Result<()> {
    let placeholders = count_placeholders(sql);
    if placeholders == bindings.len() {
        Ok(())
    } else {
        Err(CompileError::BindingMismatch {
            sql: sql.to_string(),
            placeholders,
            bindings: bindings.len(),
        })
    }
}

/// Counts `?` placeholders, skipping `'…'`, `"…"` and `` `…` `` sections.
/// A doubled quote character inside a section is an escaped quote.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                if chars.peek() == Some(&q) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => count += 1,
                _ => {}
            },
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_skips_quoted_sections() {
        assert_eq!(count_placeholders("select * from t where a = ? and b = ?"), 2);
        assert_eq!(count_placeholders("select '?' from `t?` where \"c?\" = ?"), 1);
        assert_eq!(count_placeholders("select 'it''s ?' , ?"), 1);
    }

    #[test]
    fn test_validate_reports_mismatch() {
        let statement = CompiledStatement::new("select ?", Vec::new());
        assert_eq!(
            statement.validate(),
            Err(CompileError::BindingMismatch {
                sql: String::from("select ?"),
                placeholders: 1,
                bindings: 0,
            })
        );
        assert!(CompiledStatement::new("select ?", vec![SqlValue::Int(1)])
            .validate()
            .is_ok());
    }
}
