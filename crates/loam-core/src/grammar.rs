//! Identifier wrapping and parameter handling shared by query and schema
//! grammars.

use crate::query::Column;
use crate::value::{Param, SqlValue};

/// Quoting and parameter rules common to every grammar.
pub trait BaseGrammar {
    /// Dialect name used in error messages.
    fn dialect(&self) -> &'static str;

    /// Prefix prepended to every table name.
    fn table_prefix(&self) -> &str;

    /// Quotes a single identifier segment. `*` is left untouched.
    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        format!("\"{}\"", value.replace('"', "\"\""))
    }

    /// Wraps a possibly qualified (`table.column`) or aliased
    /// (`column as alias`) identifier.
    fn wrap(&self, value: &str) -> String {
        if let Some((segment, alias)) = split_alias(value) {
            return format!("{} as {}", self.wrap(segment), self.wrap_value(alias));
        }

        let segments: Vec<&str> = value.split('.').collect();
        let count = segments.len();
        segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                if index == 0 && count > 1 {
                    self.wrap_table(segment)
                } else {
                    self.wrap_value(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Wraps a table name, applying the table prefix to the name and to
    /// its alias. A schema qualifier is left unprefixed.
    fn wrap_table(&self, table: &str) -> String {
        let prefix = self.table_prefix();
        if let Some((segment, alias)) = split_alias(table) {
            return format!(
                "{} as {}",
                self.wrap_table(segment),
                self.wrap_value(&format!("{prefix}{alias}"))
            );
        }
        match table.rsplit_once('.') {
            Some((schema, name)) => format!(
                "{}.{}",
                self.wrap_value(schema),
                self.wrap_value(&format!("{prefix}{name}"))
            ),
            None => self.wrap_value(&format!("{prefix}{table}")),
        }
    }

    /// Wraps a column reference; raw expressions pass through verbatim.
    fn wrap_column(&self, column: &Column) -> String {
        match column {
            Column::Name(name) => self.wrap(name),
            Column::Raw(expression) => expression.to_string(),
        }
    }

    /// Wraps a table reference; raw expressions pass through verbatim.
    fn wrap_table_column(&self, table: &Column) -> String {
        match table {
            Column::Name(name) => self.wrap_table(name),
            Column::Raw(expression) => expression.to_string(),
        }
    }

    /// Comma separated list of wrapped columns.
    fn columnize(&self, columns: &[Column]) -> String {
        columns
            .iter()
            .map(|c| self.wrap_column(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Comma separated list of wrapped plain names.
    fn columnize_names(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.wrap(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the placeholder for a parameter and records its binding.
    fn parameter(&self, param: &Param, bindings: &mut Vec<SqlValue>) -> String {
        match param {
            Param::Value(value) => {
                bindings.push(value.clone());
                String::from("?")
            }
            Param::Raw(expression) => expression.to_string(),
        }
    }

    /// Comma separated placeholders for a list of parameters.
    fn parameterize(&self, params: &[Param], bindings: &mut Vec<SqlValue>) -> String {
        params
            .iter()
            .map(|p| self.parameter(p, bindings))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Quotes a string literal.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Splits `expr as alias` (case-insensitive `as`) into its two halves.
fn split_alias(value: &str) -> Option<(&str, &str)> {
    let lower = value.to_ascii_lowercase();
    let position = lower.find(" as ")?;
    Some((
        value[..position].trim(),
        value[position + " as ".len()..].trim(),
    ))
}
