//! MySQL query grammar.

use crate::error::Result;
use crate::grammar::BaseGrammar;
use crate::query::{Lock, Query, Record};
use crate::statement::CompiledStatement;

use super::{concatenate, table_reference, QueryGrammar};

/// Largest row count MySQL accepts; used to express offset without limit.
const MAX_ROWS: u64 = u64::MAX;

/// MySQL grammar: backtick quoting, `insert ignore`,
/// `on duplicate key update`, native update/delete joins.
#[derive(Debug, Clone, Default)]
pub struct MySqlGrammar {
    table_prefix: String,
}

impl MySqlGrammar {
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

    /// Single-table updates and deletes accept `order by` and `limit`.
    fn append_order_and_limit(&self, query: &Query, statement: &mut CompiledStatement) {
        let orders = self.compile_orders(&query.orders, &mut statement.bindings);
        let limit = query
            .limit
            .map(|limit| format!("limit {limit}"))
            .unwrap_or_default();
        statement.sql = concatenate(vec![std::mem::take(&mut statement.sql), orders, limit]);
    }
}

impl BaseGrammar for MySqlGrammar {
    fn dialect(&self) -> &'static str {
        "MySQL"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        format!("`{}`", value.replace('`', "``"))
    }
}

impl QueryGrammar for MySqlGrammar {
    fn extra_operators(&self) -> &'static [&'static str] {
        &[
            "<=>",
            "like binary",
            "rlike",
            "not rlike",
            "regexp",
            "not regexp",
            "sounds like",
            "^",
            "&~",
        ]
    }

    fn compile_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, Some(offset)) => format!("limit {MAX_ROWS} offset {offset}"),
            (Some(limit), Some(offset)) => format!("limit {limit} offset {offset}"),
            (Some(limit), None) => format!("limit {limit}"),
            (None, None) => String::new(),
        }
    }

    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Update => String::from("for update"),
            Lock::Shared => String::from("lock in share mode"),
            Lock::Raw(sql) => sql.clone(),
        }
    }

    fn compile_insert_default_values(&self, table: &str) -> String {
        format!("insert into {table} () values ()")
    }

    fn compile_insert_or_ignore(
        &self,
        query: &Query,
        records: &[Record],
    ) -> Result<CompiledStatement> {
        let mut statement = self.compile_insert(query, records)?;
        statement.sql = statement.sql.replacen("insert", "insert ignore", 1);
        Ok(statement)
    }

    fn compile_upsert(
        &self,
        query: &Query,
        records: &[Record],
        unique_by: &[&str],
        update: &[&str],
    ) -> Result<CompiledStatement> {
        let _ = unique_by;
        if update.is_empty() {
            return self.compile_insert_or_ignore(query, records);
        }
        let mut statement = self.compile_insert(query, records)?;
        let assignments: Vec<String> = update
            .iter()
            .map(|column| {
                let column = self.wrap(column);
                format!("{column} = values({column})")
            })
            .collect();
        statement.sql = format!(
            "{} on duplicate key update {}",
            statement.sql,
            assignments.join(", ")
        );
        Ok(statement)
    }

    fn compile_update(&self, query: &Query, values: &Record) -> Result<CompiledStatement> {
        let mut statement = self.compile_base_update(query, values)?;
        if query.joins.is_empty() {
            self.append_order_and_limit(query, &mut statement);
        }
        Ok(statement)
    }

    fn compile_delete(&self, query: &Query) -> Result<CompiledStatement> {
        if query.joins.is_empty() {
            let mut statement = self.compile_base_delete(query)?;
            self.append_order_and_limit(query, &mut statement);
            return Ok(statement);
        }

        let table = self.statement_table(query, "delete")?;
        let alias = table_reference(query).map_or_else(|| table.clone(), |t| self.wrap_table(&t));
        let mut bindings = Vec::new();
        let joins = self.compile_joins(&query.joins, &mut bindings)?;
        let wheres = self.compile_wheres(&query.wheres, &mut bindings)?;
        Ok(CompiledStatement::new(
            concatenate(vec![format!("delete {alias} from {table}"), joins, wheres]),
            bindings,
        ))
    }

    fn compile_truncate(&self, query: &Query) -> Result<Vec<CompiledStatement>> {
        let table = self.statement_table(query, "truncate")?;
        Ok(vec![CompiledStatement::raw(format!("truncate table {table}"))])
    }

    fn compile_begin_transaction(&self) -> String {
        String::from("start transaction")
    }
}
