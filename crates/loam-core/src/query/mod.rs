//! Query builder state and its dialect grammars.
//!
//! [`Query`] only collects clauses; it knows nothing about SQL syntax. A
//! [`QueryGrammar`](grammar::QueryGrammar) turns it into a
//! [`CompiledStatement`](crate::CompiledStatement) for one dialect:
//!
//! ```rust
//! use loam_core::query::grammar::{MySqlGrammar, QueryGrammar};
//! use loam_core::query::Query;
//!
//! let query = Query::table("users")
//!     .where_("age", ">", 18)
//!     .where_nested(|q| q.where_("city", "=", "X").or_where("city", "=", "Y"));
//!
//! let compiled = MySqlGrammar::new().compile_select(&query).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "select * from `users` where `age` > ? and (`city` = ? or `city` = ?)"
//! );
//! assert_eq!(compiled.bindings.len(), 3);
//! ```

mod clause;
pub mod grammar;

pub use clause::{
    Aggregate, Boolean, Column, Direction, JoinClause, JoinType, Lock, OrderClause, WhereClause,
};

use crate::value::{Param, SqlValue};

/// Column/value pairs for insert, update and upsert statements.
pub type Record = Vec<(String, Param)>;

/// Builds a [`Record`] from `(column, value)` pairs.
#[must_use]
pub fn record<K, V, I>(pairs: I) -> Record
where
    K: Into<String>,
    V: Into<Param>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Driver-agnostic query state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Aggregate replacing the column list.
    pub aggregate: Option<Aggregate>,
    /// Selected columns; empty means `*`.
    pub columns: Vec<Column>,
    /// `select distinct`.
    pub distinct: bool,
    /// Source table.
    pub from: Option<Column>,
    /// Joins in declaration order.
    pub joins: Vec<JoinClause>,
    /// Top level where predicates.
    pub wheres: Vec<WhereClause>,
    /// `group by` columns.
    pub groups: Vec<Column>,
    /// Having predicates.
    pub havings: Vec<WhereClause>,
    /// `order by` items.
    pub orders: Vec<OrderClause>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Row offset.
    pub offset: Option<u64>,
    /// Row lock.
    pub lock: Option<Lock>,
}

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query against `table`.
    #[must_use]
    pub fn table(table: impl Into<Column>) -> Self {
        Self::new().from(table)
    }

    /// Sets the source table.
    #[must_use]
    pub fn from(mut self, table: impl Into<Column>) -> Self {
        self.from = Some(table.into());
        self
    }

    /// Replaces the selected columns.
    #[must_use]
    pub fn select<C, I>(mut self, columns: I) -> Self
    where
        C: Into<Column>,
        I: IntoIterator<Item = C>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a selected column.
    #[must_use]
    pub fn add_select(mut self, column: impl Into<Column>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Selects distinct rows.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Replaces the column list by an aggregate function.
    #[must_use]
    pub fn aggregate<C, I>(mut self, function: &str, columns: I) -> Self
    where
        C: Into<Column>,
        I: IntoIterator<Item = C>,
    {
        self.aggregate = Some(Aggregate {
            function: function.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds a prepared join.
    #[must_use]
    pub fn join_clause(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// `inner join table on first <op> second`
    #[must_use]
    pub fn join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.join_clause(JoinClause::new(JoinType::Inner, table).on(first, operator, second))
    }

    /// `left join table on first <op> second`
    #[must_use]
    pub fn left_join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.join_clause(JoinClause::new(JoinType::Left, table).on(first, operator, second))
    }

    /// `right join table on first <op> second`
    #[must_use]
    pub fn right_join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.join_clause(JoinClause::new(JoinType::Right, table).on(first, operator, second))
    }

    /// `cross join table`
    #[must_use]
    pub fn cross_join(self, table: impl Into<Column>) -> Self {
        self.join_clause(JoinClause::new(JoinType::Cross, table))
    }

    /// `and column <op> value`. A null value with `=` or `!=`/`<>`
    /// becomes `is null` / `is not null`.
    #[must_use]
    pub fn where_(self, column: impl Into<Column>, operator: &str, value: impl Into<Param>) -> Self {
        self.push_basic(Boolean::And, column.into(), operator, value.into())
    }

    /// `or column <op> value`
    #[must_use]
    pub fn or_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Param>,
    ) -> Self {
        self.push_basic(Boolean::Or, column.into(), operator, value.into())
    }

    /// `and column = value`
    #[must_use]
    pub fn where_eq(self, column: impl Into<Column>, value: impl Into<Param>) -> Self {
        self.where_(column, "=", value)
    }

    /// `and first <op> second`
    #[must_use]
    pub fn where_column(
        mut self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.wheres.push(WhereClause::Column {
            boolean: Boolean::And,
            first: first.into(),
            operator: operator.to_string(),
            second: second.into(),
        });
        self
    }

    /// `or first <op> second`
    #[must_use]
    pub fn or_where_column(
        mut self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.wheres.push(WhereClause::Column {
            boolean: Boolean::Or,
            first: first.into(),
            operator: operator.to_string(),
            second: second.into(),
        });
        self
    }

    /// `and column between low and high`
    #[must_use]
    pub fn where_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> Self {
        self.push_between(Boolean::And, column.into(), low.into(), high.into(), false)
    }

    /// `and column not between low and high`
    #[must_use]
    pub fn where_not_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> Self {
        self.push_between(Boolean::And, column.into(), low.into(), high.into(), true)
    }

    /// `and column in (values…)`
    #[must_use]
    pub fn where_in<V, I>(self, column: impl Into<Column>, values: I) -> Self
    where
        V: Into<Param>,
        I: IntoIterator<Item = V>,
    {
        self.push_in(Boolean::And, column.into(), values, false)
    }

    /// `or column in (values…)`
    #[must_use]
    pub fn or_where_in<V, I>(self, column: impl Into<Column>, values: I) -> Self
    where
        V: Into<Param>,
        I: IntoIterator<Item = V>,
    {
        self.push_in(Boolean::Or, column.into(), values, false)
    }

    /// `and column not in (values…)`
    #[must_use]
    pub fn where_not_in<V, I>(self, column: impl Into<Column>, values: I) -> Self
    where
        V: Into<Param>,
        I: IntoIterator<Item = V>,
    {
        self.push_in(Boolean::And, column.into(), values, true)
    }

    /// `and column is null`
    #[must_use]
    pub fn where_null(self, column: impl Into<Column>) -> Self {
        self.push_null(Boolean::And, column.into(), false)
    }

    /// `or column is null`
    #[must_use]
    pub fn or_where_null(self, column: impl Into<Column>) -> Self {
        self.push_null(Boolean::Or, column.into(), false)
    }

    /// `and column is not null`
    #[must_use]
    pub fn where_not_null(self, column: impl Into<Column>) -> Self {
        self.push_null(Boolean::And, column.into(), true)
    }

    /// `and <sql>` with its own bindings.
    #[must_use]
    pub fn where_raw(mut self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.wheres.push(WhereClause::Raw {
            boolean: Boolean::And,
            sql: sql.to_string(),
            bindings,
        });
        self
    }

    /// `or <sql>` with its own bindings.
    #[must_use]
    pub fn or_where_raw(mut self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.wheres.push(WhereClause::Raw {
            boolean: Boolean::Or,
            sql: sql.to_string(),
            bindings,
        });
        self
    }

    /// `and (…)`: the callback fills a fresh query whose wheres become the
    /// group. Empty groups are dropped.
    #[must_use]
    pub fn where_nested(self, build: impl FnOnce(Self) -> Self) -> Self {
        self.push_nested(Boolean::And, build)
    }

    /// `or (…)`
    #[must_use]
    pub fn or_where_nested(self, build: impl FnOnce(Self) -> Self) -> Self {
        self.push_nested(Boolean::Or, build)
    }

    /// `and column in (select …)`
    #[must_use]
    pub fn where_in_sub(mut self, column: impl Into<Column>, query: Self) -> Self {
        self.wheres.push(WhereClause::InSub {
            boolean: Boolean::And,
            column: column.into(),
            query: Box::new(query),
            negated: false,
        });
        self
    }

    /// `and column not in (select …)`
    #[must_use]
    pub fn where_not_in_sub(mut self, column: impl Into<Column>, query: Self) -> Self {
        self.wheres.push(WhereClause::InSub {
            boolean: Boolean::And,
            column: column.into(),
            query: Box::new(query),
            negated: true,
        });
        self
    }

    /// `and exists (select …)`
    #[must_use]
    pub fn where_exists(mut self, query: Self) -> Self {
        self.wheres.push(WhereClause::Exists {
            boolean: Boolean::And,
            query: Box::new(query),
            negated: false,
        });
        self
    }

    /// `and not exists (select …)`
    #[must_use]
    pub fn where_not_exists(mut self, query: Self) -> Self {
        self.wheres.push(WhereClause::Exists {
            boolean: Boolean::And,
            query: Box::new(query),
            negated: true,
        });
        self
    }

    /// `and column <op> (select …)`
    #[must_use]
    pub fn where_sub(mut self, column: impl Into<Column>, operator: &str, query: Self) -> Self {
        self.wheres.push(WhereClause::Sub {
            boolean: Boolean::And,
            column: column.into(),
            operator: operator.to_string(),
            query: Box::new(query),
        });
        self
    }

    /// Adds `group by` columns.
    #[must_use]
    pub fn group_by<C, I>(mut self, columns: I) -> Self
    where
        C: Into<Column>,
        I: IntoIterator<Item = C>,
    {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    /// `having column <op> value`
    #[must_use]
    pub fn having(
        mut self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Param>,
    ) -> Self {
        self.havings.push(WhereClause::Basic {
            boolean: Boolean::And,
            column: column.into(),
            operator: operator.to_string(),
            value: value.into(),
        });
        self
    }

    /// `or column <op> value` in the having clause.
    #[must_use]
    pub fn or_having(
        mut self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Param>,
    ) -> Self {
        self.havings.push(WhereClause::Basic {
            boolean: Boolean::Or,
            column: column.into(),
            operator: operator.to_string(),
            value: value.into(),
        });
        self
    }

    /// Verbatim having predicate.
    #[must_use]
    pub fn having_raw(mut self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.havings.push(WhereClause::Raw {
            boolean: Boolean::And,
            sql: sql.to_string(),
            bindings,
        });
        self
    }

    /// `order by column direction`
    #[must_use]
    pub fn order_by(mut self, column: impl Into<Column>, direction: Direction) -> Self {
        self.orders.push(OrderClause::Column {
            column: column.into(),
            direction,
        });
        self
    }

    /// `order by column desc`
    #[must_use]
    pub fn order_by_desc(self, column: impl Into<Column>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    /// Verbatim ordering.
    #[must_use]
    pub fn order_by_raw(mut self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.orders.push(OrderClause::Raw {
            sql: sql.to_string(),
            bindings,
        });
        self
    }

    /// Limits the number of rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips rows.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets limit and offset for a one-based page number.
    #[must_use]
    pub fn for_page(self, page: u64, per_page: u64) -> Self {
        self.offset(page.saturating_sub(1).saturating_mul(per_page)).limit(per_page)
    }

    /// Locks the selected rows for update.
    #[must_use]
    pub fn lock_for_update(self) -> Self {
        self.lock(Lock::Update)
    }

    /// Takes a shared lock on the selected rows.
    #[must_use]
    pub fn shared_lock(self) -> Self {
        self.lock(Lock::Shared)
    }

    /// Sets the lock mode.
    #[must_use]
    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    fn push_basic(mut self, boolean: Boolean, column: Column, operator: &str, value: Param) -> Self {
        if value == Param::Value(SqlValue::Null) {
            match operator {
                "=" => return self.push_null(boolean, column, false),
                "!=" | "<>" => return self.push_null(boolean, column, true),
                _ => {}
            }
        }
        self.wheres.push(WhereClause::Basic {
            boolean,
            column,
            operator: operator.to_string(),
            value,
        });
        self
    }

    fn push_between(
        mut self,
        boolean: Boolean,
        column: Column,
        low: Param,
        high: Param,
        negated: bool,
    ) -> Self {
        self.wheres.push(WhereClause::Between {
            boolean,
            column,
            low,
            high,
            negated,
        });
        self
    }

    fn push_in<V, I>(mut self, boolean: Boolean, column: Column, values: I, negated: bool) -> Self
    where
        V: Into<Param>,
        I: IntoIterator<Item = V>,
    {
        self.wheres.push(WhereClause::In {
            boolean,
            column,
            values: values.into_iter().map(Into::into).collect(),
            negated,
        });
        self
    }

    fn push_null(mut self, boolean: Boolean, column: Column, negated: bool) -> Self {
        self.wheres.push(WhereClause::Null {
            boolean,
            column,
            negated,
        });
        self
    }

    fn push_nested(mut self, boolean: Boolean, build: impl FnOnce(Self) -> Self) -> Self {
        let nested = build(Self::new());
        if !nested.wheres.is_empty() {
            self.wheres.push(WhereClause::Nested {
                boolean,
                wheres: nested.wheres,
            });
        }
        self
    }
}
