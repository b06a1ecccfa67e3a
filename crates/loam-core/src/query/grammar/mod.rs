//! Query grammars: compile [`Query`] state into dialect SQL.
//!
//! The shared compilation lives in [`QueryGrammar`]'s default methods; each
//! dialect overrides only the points where its syntax diverges (quoting,
//! operators, limit/offset, locks, upsert, update/delete with joins,
//! truncate).
//!
//! Every fragment is produced in the order it appears in the final text and
//! pushes its bindings as it goes, so bindings always follow placeholder
//! order.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use crate::error::{CompileError, Result};
use crate::grammar::BaseGrammar;
use crate::statement::CompiledStatement;
use crate::value::{Param, SqlValue};

use super::{Aggregate, Column, JoinClause, JoinType, Lock, OrderClause, Query, Record, WhereClause};

/// Operators accepted by every dialect.
const COMMON_OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "&", "|", "<<", ">>",
];

/// Compiles query state into SQL for one dialect.
pub trait QueryGrammar: BaseGrammar + Send + Sync {
    /// Operators beyond the common set.
    fn extra_operators(&self) -> &'static [&'static str] {
        &[]
    }

    /// True when `operator` is valid for this dialect (case-insensitive).
    fn is_operator(&self, operator: &str) -> bool {
        let operator = operator.to_ascii_lowercase();
        COMMON_OPERATORS.contains(&operator.as_str())
            || self.extra_operators().contains(&operator.as_str())
    }

    /// Fails with [`CompileError::InvalidOperator`] for unknown operators.
    fn check_operator(&self, operator: &str) -> Result<()> {
        if self.is_operator(operator) {
            Ok(())
        } else {
            Err(CompileError::InvalidOperator {
                operator: operator.to_string(),
                dialect: self.dialect(),
            })
        }
    }

    /// Compiles a select statement.
    fn compile_select(&self, query: &Query) -> Result<CompiledStatement> {
        let mut bindings = Vec::new();
        let sql = self.compile_select_into(query, &mut bindings)?;
        Ok(CompiledStatement::new(sql, bindings))
    }

    /// Compiles `select exists(…) as "exists"`.
    fn compile_exists(&self, query: &Query) -> Result<CompiledStatement> {
        let mut bindings = Vec::new();
        let select = self.compile_select_into(query, &mut bindings)?;
        Ok(CompiledStatement::new(
            format!("select exists({select}) as {}", self.wrap_value("exists")),
            bindings,
        ))
    }

    /// Compiles the select components in their fixed order.
    fn compile_select_into(&self, query: &Query, bindings: &mut Vec<SqlValue>) -> Result<String> {
        let mut parts = Vec::new();

        parts.push(query.aggregate.as_ref().map_or_else(
            || self.compile_columns(query),
            |aggregate| self.compile_aggregate(query, aggregate),
        ));
        if let Some(from) = &query.from {
            parts.push(format!("from {}", self.wrap_table_column(from)));
        }
        if !query.joins.is_empty() {
            parts.push(self.compile_joins(&query.joins, bindings)?);
        }
        parts.push(self.compile_wheres(&query.wheres, bindings)?);
        if !query.groups.is_empty() {
            parts.push(format!("group by {}", self.columnize(&query.groups)));
        }
        parts.push(self.compile_havings(&query.havings, bindings)?);
        parts.push(self.compile_orders(&query.orders, bindings));
        parts.push(self.compile_limit_offset(query.limit, query.offset));
        if let Some(lock) = &query.lock {
            parts.push(self.compile_lock(lock));
        }

        Ok(concatenate(parts))
    }

    /// `select [distinct] columns`
    fn compile_columns(&self, query: &Query) -> String {
        let select = if query.distinct {
            "select distinct"
        } else {
            "select"
        };
        if query.columns.is_empty() {
            format!("{select} *")
        } else {
            format!("{select} {}", self.columnize(&query.columns))
        }
    }

    /// `select fn(columns) as aggregate`
    fn compile_aggregate(&self, query: &Query, aggregate: &Aggregate) -> String {
        let mut column = if aggregate.columns.is_empty() {
            String::from("*")
        } else {
            self.columnize(&aggregate.columns)
        };
        if query.distinct && column != "*" {
            column = format!("distinct {column}");
        }
        format!("select {}({column}) as aggregate", aggregate.function)
    }

    /// Compiles all joins.
    fn compile_joins(&self, joins: &[JoinClause], bindings: &mut Vec<SqlValue>) -> Result<String> {
        let mut compiled = Vec::with_capacity(joins.len());
        for join in joins {
            let table = self.wrap_table_column(&join.table);
            if join.kind == JoinType::Cross && join.wheres.is_empty() {
                compiled.push(format!("cross join {table}"));
            } else {
                let on = self.compile_where_list(&join.wheres, bindings)?;
                compiled.push(format!("{} join {table} on {on}", join.kind.as_sql()));
            }
        }
        Ok(compiled.join(" "))
    }

    /// `where …`, or an empty string when there are no predicates.
    fn compile_wheres(&self, wheres: &[WhereClause], bindings: &mut Vec<SqlValue>) -> Result<String> {
        let list = self.compile_where_list(wheres, bindings)?;
        Ok(if list.is_empty() {
            list
        } else {
            format!("where {list}")
        })
    }

    /// `having …`, or an empty string.
    fn compile_havings(
        &self,
        havings: &[WhereClause],
        bindings: &mut Vec<SqlValue>,
    ) -> Result<String> {
        let list = self.compile_where_list(havings, bindings)?;
        Ok(if list.is_empty() {
            list
        } else {
            format!("having {list}")
        })
    }

    /// Joins predicates with their connectives, dropping the leading one.
    /// Empty nested groups are skipped.
    fn compile_where_list(
        &self,
        wheres: &[WhereClause],
        bindings: &mut Vec<SqlValue>,
    ) -> Result<String> {
        let mut sql = String::new();
        let mut first = true;
        for clause in wheres {
            if matches!(clause, WhereClause::Nested { wheres, .. } if wheres.is_empty()) {
                continue;
            }
            let fragment = self.compile_where(clause, bindings)?;
            if !first {
                sql.push(' ');
                sql.push_str(clause.boolean().as_sql());
                sql.push(' ');
            }
            sql.push_str(&fragment);
            first = false;
        }
        Ok(sql)
    }

    /// Compiles one where-tree node, recursing into groups and sub-selects.
    fn compile_where(&self, clause: &WhereClause, bindings: &mut Vec<SqlValue>) -> Result<String> {
        match clause {
            WhereClause::Basic {
                column,
                operator,
                value,
                ..
            } => {
                self.check_operator(operator)?;
                Ok(self.where_basic(column, operator, value, bindings))
            }
            WhereClause::Column {
                first,
                operator,
                second,
                ..
            } => {
                self.check_operator(operator)?;
                Ok(format!(
                    "{} {operator} {}",
                    self.wrap_column(first),
                    self.wrap_column(second)
                ))
            }
            WhereClause::Between {
                column,
                low,
                high,
                negated,
                ..
            } => {
                let column = self.wrap_column(column);
                let low = self.parameter(low, bindings);
                let high = self.parameter(high, bindings);
                let between = if *negated { "not between" } else { "between" };
                Ok(format!("{column} {between} {low} and {high}"))
            }
            WhereClause::In {
                column,
                values,
                negated,
                ..
            } => Ok(if values.is_empty() {
                String::from(if *negated { "1 = 1" } else { "0 = 1" })
            } else {
                let column = self.wrap_column(column);
                let keyword = if *negated { "not in" } else { "in" };
                format!("{column} {keyword} ({})", self.parameterize(values, bindings))
            }),
            WhereClause::Null {
                column, negated, ..
            } => {
                let check = if *negated { "is not null" } else { "is null" };
                Ok(format!("{} {check}", self.wrap_column(column)))
            }
            WhereClause::Nested { wheres, .. } => {
                Ok(format!("({})", self.compile_where_list(wheres, bindings)?))
            }
            WhereClause::Raw {
                sql,
                bindings: raw_bindings,
                ..
            } => {
                bindings.extend(raw_bindings.iter().cloned());
                Ok(sql.clone())
            }
            WhereClause::InSub {
                column,
                query,
                negated,
                ..
            } => {
                let column = self.wrap_column(column);
                let keyword = if *negated { "not in" } else { "in" };
                let select = self.compile_select_into(query, bindings)?;
                Ok(format!("{column} {keyword} ({select})"))
            }
            WhereClause::Exists { query, negated, .. } => {
                let keyword = if *negated { "not exists" } else { "exists" };
                let select = self.compile_select_into(query, bindings)?;
                Ok(format!("{keyword} ({select})"))
            }
            WhereClause::Sub {
                column,
                operator,
                query,
                ..
            } => {
                self.check_operator(operator)?;
                let column = self.wrap_column(column);
                let select = self.compile_select_into(query, bindings)?;
                Ok(format!("{column} {operator} ({select})"))
            }
        }
    }

    /// `column <op> ?`
    fn where_basic(
        &self,
        column: &Column,
        operator: &str,
        value: &Param,
        bindings: &mut Vec<SqlValue>,
    ) -> String {
        format!(
            "{} {operator} {}",
            self.wrap_column(column),
            self.parameter(value, bindings)
        )
    }

    /// `order by …`, or an empty string.
    fn compile_orders(&self, orders: &[OrderClause], bindings: &mut Vec<SqlValue>) -> String {
        if orders.is_empty() {
            return String::new();
        }
        let items: Vec<String> = orders
            .iter()
            .map(|order| match order {
                OrderClause::Column { column, direction } => {
                    format!("{} {}", self.wrap_column(column), direction.as_sql())
                }
                OrderClause::Raw {
                    sql,
                    bindings: raw_bindings,
                } => {
                    bindings.extend(raw_bindings.iter().cloned());
                    sql.clone()
                }
            })
            .collect();
        format!("order by {}", items.join(", "))
    }

    /// `limit n offset m`; either half may be absent.
    fn compile_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut parts = Vec::new();
        if let Some(limit) = limit {
            parts.push(format!("limit {limit}"));
        }
        if let Some(offset) = offset {
            parts.push(format!("offset {offset}"));
        }
        parts.join(" ")
    }

    /// Row lock clause.
    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Update => String::from("for update"),
            Lock::Shared => String::from("for share"),
            Lock::Raw(sql) => sql.clone(),
        }
    }

    /// Compiles a (multi-row) insert. Every record must carry the columns
    /// of the first one.
    fn compile_insert(&self, query: &Query, records: &[Record]) -> Result<CompiledStatement> {
        let table = self.statement_table(query, "insert")?;
        let Some(first) = records.first().filter(|r| !r.is_empty()) else {
            return Ok(CompiledStatement::raw(
                self.compile_insert_default_values(&table),
            ));
        };

        let columns: Vec<String> = first.iter().map(|(c, _)| c.clone()).collect();
        let mut bindings = Vec::new();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let values = align_record(&columns, record)?;
            let placeholders: Vec<String> = values
                .into_iter()
                .map(|value| self.parameter(value, &mut bindings))
                .collect();
            rows.push(format!("({})", placeholders.join(", ")));
        }

        Ok(CompiledStatement::new(
            format!(
                "insert into {table} ({}) values {}",
                self.columnize_names(&columns),
                rows.join(", ")
            ),
            bindings,
        ))
    }

    /// Insert of a row made only of column defaults.
    fn compile_insert_default_values(&self, table: &str) -> String {
        format!("insert into {table} default values")
    }

    /// Insert that silently skips rows violating unique constraints.
    fn compile_insert_or_ignore(
        &self,
        query: &Query,
        records: &[Record],
    ) -> Result<CompiledStatement>;

    /// Insert returning the generated key. `sequence` names the key column.
    fn compile_insert_get_id(
        &self,
        query: &Query,
        record: &Record,
        sequence: Option<&str>,
    ) -> Result<CompiledStatement> {
        let _ = sequence;
        self.compile_insert(query, std::slice::from_ref(record))
    }

    /// Insert or update on a unique key conflict.
    fn compile_upsert(
        &self,
        query: &Query,
        records: &[Record],
        unique_by: &[&str],
        update: &[&str],
    ) -> Result<CompiledStatement>;

    /// `on conflict ("a") do update set "b" = "excluded"."b"`
    ///
    /// An empty `unique_by` has no conflict target and is rejected.
    fn compile_on_conflict_update(&self, unique_by: &[&str], update: &[&str]) -> Result<String> {
        if unique_by.is_empty() {
            return Err(CompileError::Unsupported {
                dialect: self.dialect(),
                feature: String::from("upserts without unique columns"),
            });
        }
        let unique: Vec<String> = unique_by.iter().map(|c| self.wrap(c)).collect();
        let assignments: Vec<String> = update
            .iter()
            .map(|column| {
                let column = self.wrap(column);
                format!("{column} = {}.{column}", self.wrap_value("excluded"))
            })
            .collect();
        Ok(format!(
            "on conflict ({}) do update set {}",
            unique.join(", "),
            assignments.join(", ")
        ))
    }

    /// Compiles an update.
    fn compile_update(&self, query: &Query, values: &Record) -> Result<CompiledStatement> {
        self.compile_base_update(query, values)
    }

    /// `update table [joins] set … [where …]`
    fn compile_base_update(&self, query: &Query, values: &Record) -> Result<CompiledStatement> {
        let table = self.statement_table(query, "update")?;
        if values.is_empty() {
            return Err(CompileError::EmptyValues("update"));
        }
        let mut bindings = Vec::new();
        let joins = if query.joins.is_empty() {
            String::new()
        } else {
            self.compile_joins(&query.joins, &mut bindings)?
        };
        let columns = self.compile_update_columns(values, &mut bindings);
        let wheres = self.compile_wheres(&query.wheres, &mut bindings)?;
        Ok(CompiledStatement::new(
            concatenate(vec![
                format!("update {table}"),
                joins,
                format!("set {columns}"),
                wheres,
            ]),
            bindings,
        ))
    }

    /// `a = ?, b = ?`
    fn compile_update_columns(&self, values: &Record, bindings: &mut Vec<SqlValue>) -> String {
        values
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap(column), self.parameter(value, bindings)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Update restricted through a row-key sub-select, for dialects that
    /// cannot join or limit an update directly.
    fn compile_update_by_key(
        &self,
        query: &Query,
        values: &Record,
        key: &str,
    ) -> Result<CompiledStatement> {
        let table = self.statement_table(query, "update")?;
        if values.is_empty() {
            return Err(CompileError::EmptyValues("update"));
        }
        let mut bindings = Vec::new();
        let columns = self.compile_update_columns(values, &mut bindings);
        let select = self.compile_select_into(&key_query(query, key), &mut bindings)?;
        Ok(CompiledStatement::new(
            format!(
                "update {table} set {columns} where {} in ({select})",
                self.wrap(key)
            ),
            bindings,
        ))
    }

    /// Compiles a delete.
    fn compile_delete(&self, query: &Query) -> Result<CompiledStatement> {
        self.compile_base_delete(query)
    }

    /// `delete from table [where …]`
    fn compile_base_delete(&self, query: &Query) -> Result<CompiledStatement> {
        let table = self.statement_table(query, "delete")?;
        let mut bindings = Vec::new();
        let wheres = self.compile_wheres(&query.wheres, &mut bindings)?;
        Ok(CompiledStatement::new(
            concatenate(vec![format!("delete from {table}"), wheres]),
            bindings,
        ))
    }

    /// Delete restricted through a row-key sub-select.
    fn compile_delete_by_key(&self, query: &Query, key: &str) -> Result<CompiledStatement> {
        let table = self.statement_table(query, "delete")?;
        let mut bindings = Vec::new();
        let select = self.compile_select_into(&key_query(query, key), &mut bindings)?;
        Ok(CompiledStatement::new(
            format!("delete from {table} where {} in ({select})", self.wrap(key)),
            bindings,
        ))
    }

    /// Empties a table; some dialects need more than one statement.
    fn compile_truncate(&self, query: &Query) -> Result<Vec<CompiledStatement>>;

    /// Key counter reset to run after a truncate, for dialects whose
    /// truncate leaves generated keys where they were.
    fn compile_sequence_reset(&self, _query: &Query) -> Option<SequenceReset> {
        None
    }

    /// Starts a transaction.
    fn compile_begin_transaction(&self) -> String {
        String::from("begin")
    }

    /// Commits the current transaction.
    fn compile_commit(&self) -> String {
        String::from("commit")
    }

    /// Rolls the current transaction back.
    fn compile_rollback(&self) -> String {
        String::from("rollback")
    }

    /// Creates a savepoint.
    fn compile_savepoint(&self, name: &str) -> String {
        format!("savepoint {}", self.wrap_value(name))
    }

    /// Rolls back to a savepoint.
    fn compile_rollback_to_savepoint(&self, name: &str) -> String {
        format!("rollback to savepoint {}", self.wrap_value(name))
    }

    /// The wrapped target table of a write statement.
    fn statement_table(&self, query: &Query, statement: &'static str) -> Result<String> {
        query
            .from
            .as_ref()
            .map(|table| self.wrap_table_column(table))
            .ok_or(CompileError::MissingTable(statement))
    }
}

/// Resets the generated key counter of a table.
///
/// The counter store may not exist yet; `reset` only runs when `exists`
/// returns a truthy first column.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReset {
    /// Reports whether the counter store exists.
    pub exists: CompiledStatement,
    /// Forgets the table's counter.
    pub reset: CompiledStatement,
}

/// Joins non-empty parts with single spaces.
pub(crate) fn concatenate(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Orders `record`'s values by `columns`.
pub(crate) fn align_record<'a>(columns: &[String], record: &'a Record) -> Result<Vec<&'a Param>> {
    if let Some((extra, _)) = record
        .iter()
        .find(|(column, _)| !columns.contains(column))
    {
        return Err(CompileError::RecordMismatch(extra.clone()));
    }
    columns
        .iter()
        .map(|column| {
            record
                .iter()
                .find(|(c, _)| c == column)
                .map(|(_, value)| value)
                .ok_or_else(|| CompileError::RecordMismatch(column.clone()))
        })
        .collect()
}

/// Name under which the target table is addressed: its alias if it has one.
pub(crate) fn table_reference(query: &Query) -> Option<String> {
    match query.from.as_ref()? {
        Column::Name(name) => {
            let lower = name.to_ascii_lowercase();
            Some(match lower.find(" as ") {
                Some(position) => name[position + 4..].trim().to_string(),
                None => name.clone(),
            })
        }
        Column::Raw(_) => None,
    }
}

/// The target table name without its alias.
pub(crate) fn table_name(query: &Query) -> Option<&str> {
    match query.from.as_ref()? {
        Column::Name(name) => {
            let lower = name.to_ascii_lowercase();
            Some(lower.find(" as ").map_or(name.as_str(), |position| name[..position].trim()))
        }
        Column::Raw(_) => None,
    }
}

/// `select table.key from …` keeping joins, wheres, orders and limit.
fn key_query(query: &Query, key: &str) -> Query {
    let column = table_reference(query).map_or_else(|| key.to_string(), |t| format!("{t}.{key}"));
    Query {
        aggregate: None,
        columns: vec![Column::Name(column)],
        distinct: false,
        lock: None,
        ..query.clone()
    }
}
