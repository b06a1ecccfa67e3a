//! PostgreSQL query grammar.

use crate::error::Result;
use crate::grammar::BaseGrammar;
use crate::query::{Column, Query, Record};
use crate::statement::CompiledStatement;
use crate::value::{Param, SqlValue};

use super::QueryGrammar;

/// PostgreSQL grammar: `::text` casts for `like`, `returning` for
/// generated keys, `on conflict` upserts, `ctid` keyed joins and limits.
#[derive(Debug, Clone, Default)]
pub struct PostgresGrammar {
    table_prefix: String,
}

impl PostgresGrammar {
    /// Creates a grammar without a table prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grammar with a table prefix.
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            table_prefix: prefix.to_string(),
        }
    }
}

impl BaseGrammar for PostgresGrammar {
    fn dialect(&self) -> &'static str {
        "PostgreSQL"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }
}

impl QueryGrammar for PostgresGrammar {
    // The jsonb `?`, `?|` and `?&` operators are not accepted: they collide
    // with placeholders.
    fn extra_operators(&self) -> &'static [&'static str] {
        &[
            "ilike",
            "not ilike",
            "~",
            "~*",
            "!~",
            "!~*",
            "similar to",
            "not similar to",
            "#",
            "<<=",
            ">>=",
            "&&",
            "@>",
            "<@",
            "||",
            "-",
            "@@",
            "#-",
            "is distinct from",
            "is not distinct from",
        ]
    }

    fn where_basic(
        &self,
        column: &Column,
        operator: &str,
        value: &Param,
        bindings: &mut Vec<SqlValue>,
    ) -> String {
        let wrapped = self.wrap_column(column);
        let value = self.parameter(value, bindings);
        if operator.to_ascii_lowercase().contains("like") {
            format!("{wrapped}::text {operator} {value}")
        } else {
            format!("{wrapped} {operator} {value}")
        }
    }

    fn compile_insert_or_ignore(
        &self,
        query: &Query,
        records: &[Record],
    ) -> Result<CompiledStatement> {
        let mut statement = self.compile_insert(query, records)?;
        statement.sql.push_str(" on conflict do nothing");
        Ok(statement)
    }

    fn compile_insert_get_id(
        &self,
        query: &Query,
        record: &Record,
        sequence: Option<&str>,
    ) -> Result<CompiledStatement> {
        let mut statement = self.compile_insert(query, std::slice::from_ref(record))?;
        statement.sql = format!(
            "{} returning {}",
            statement.sql,
            self.wrap(sequence.unwrap_or("id"))
        );
        Ok(statement)
    }

    fn compile_upsert(
        &self,
        query: &Query,
        records: &[Record],
        unique_by: &[&str],
        update: &[&str],
    ) -> Result<CompiledStatement> {
        if update.is_empty() {
            return self.compile_insert_or_ignore(query, records);
        }
        let conflict = self.compile_on_conflict_update(unique_by, update)?;
        let mut statement = self.compile_insert(query, records)?;
        statement.sql = format!("{} {conflict}", statement.sql);
        Ok(statement)
    }

    fn compile_update(&self, query: &Query, values: &Record) -> Result<CompiledStatement> {
        if query.joins.is_empty() && query.limit.is_none() {
            self.compile_base_update(query, values)
        } else {
            self.compile_update_by_key(query, values, "ctid")
        }
    }

    fn compile_delete(&self, query: &Query) -> Result<CompiledStatement> {
        if query.joins.is_empty() && query.limit.is_none() {
            self.compile_base_delete(query)
        } else {
            self.compile_delete_by_key(query, "ctid")
        }
    }

    fn compile_truncate(&self, query: &Query) -> Result<Vec<CompiledStatement>> {
        let table = self.statement_table(query, "truncate")?;
        Ok(vec![CompiledStatement::raw(format!(
            "truncate {table} restart identity cascade"
        ))])
    }
}
