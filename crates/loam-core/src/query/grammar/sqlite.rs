//! SQLite query grammar.

use crate::error::Result;
use crate::grammar::BaseGrammar;
use crate::query::{Lock, Query, Record};
use crate::statement::CompiledStatement;
use crate::value::SqlValue;

use super::{table_name, QueryGrammar, SequenceReset};

/// SQLite grammar: no row locks, `insert or ignore`, `rowid` keyed
/// joins and limits, key counters reset through `sqlite_sequence`.
#[derive(Debug, Clone, Default)]
pub struct SqliteGrammar {
    table_prefix: String,
}

impl SqliteGrammar {
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

impl BaseGrammar for SqliteGrammar {
    fn dialect(&self) -> &'static str {
        "SQLite"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }
}

impl QueryGrammar for SqliteGrammar {
    fn extra_operators(&self) -> &'static [&'static str] {
        &["glob", "not glob", "regexp", "not regexp", "is", "is not"]
    }

    fn compile_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, Some(offset)) => format!("limit -1 offset {offset}"),
            (Some(limit), Some(offset)) => format!("limit {limit} offset {offset}"),
            (Some(limit), None) => format!("limit {limit}"),
            (None, None) => String::new(),
        }
    }

    fn compile_lock(&self, _lock: &Lock) -> String {
        String::new()
    }

    fn compile_insert_or_ignore(
        &self,
        query: &Query,
        records: &[Record],
    ) -> Result<CompiledStatement> {
        let mut statement = self.compile_insert(query, records)?;
        statement.sql = statement.sql.replacen("insert", "insert or ignore", 1);
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
            self.compile_update_by_key(query, values, "rowid")
        }
    }

    fn compile_delete(&self, query: &Query) -> Result<CompiledStatement> {
        if query.joins.is_empty() && query.limit.is_none() {
            self.compile_base_delete(query)
        } else {
            self.compile_delete_by_key(query, "rowid")
        }
    }

    fn compile_truncate(&self, query: &Query) -> Result<Vec<CompiledStatement>> {
        let table = self.statement_table(query, "truncate")?;
        Ok(vec![CompiledStatement::raw(format!("delete from {table}"))])
    }

    fn compile_sequence_reset(&self, query: &Query) -> Option<SequenceReset> {
        let table = table_name(query)?;
        Some(SequenceReset {
            exists: CompiledStatement::raw(
                "select exists(select 1 from sqlite_master \
                 where type = 'table' and name = 'sqlite_sequence')",
            ),
            reset: CompiledStatement::new(
                "delete from sqlite_sequence where name = ?",
                vec![SqlValue::Text(format!("{}{table}", self.table_prefix))],
            ),
        })
    }
}
