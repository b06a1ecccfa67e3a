//! Clause types that make up a query's builder state.

use crate::value::{Expression, Param, SqlValue};

use super::Query;

/// A column or table reference: a plain (possibly qualified or aliased)
/// name, or a raw expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Identifier, wrapped by the grammar.
    Name(String),
    /// Raw expression, emitted verbatim.
    Raw(Expression),
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for Column {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<Expression> for Column {
    fn from(expression: Expression) -> Self {
        Self::Raw(expression)
    }
}

/// Logical connective joining a predicate to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    /// `and`
    #[default]
    And,
    /// `or`
    Or,
}

impl Boolean {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// One node of a where (or having) tree.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    /// `column <op> value`
    Basic {
        /// Connective.
        boolean: Boolean,
        /// Left-hand column.
        column: Column,
        /// Comparison operator.
        operator: String,
        /// Right-hand value.
        value: Param,
    },
    /// `first <op> second`, both columns.
    Column {
        /// Connective.
        boolean: Boolean,
        /// Left-hand column.
        first: Column,
        /// Comparison operator.
        operator: String,
        /// Right-hand column.
        second: Column,
    },
    /// `column [not] between low and high`
    Between {
        /// Connective.
        boolean: Boolean,
        /// Tested column.
        column: Column,
        /// Lower bound.
        low: Param,
        /// Upper bound.
        high: Param,
        /// `not between`.
        negated: bool,
    },
    /// `column [not] in (values…)`
    In {
        /// Connective.
        boolean: Boolean,
        /// Tested column.
        column: Column,
        /// Candidate values.
        values: Vec<Param>,
        /// `not in`.
        negated: bool,
    },
    /// `column is [not] null`
    Null {
        /// Connective.
        boolean: Boolean,
        /// Tested column.
        column: Column,
        /// `is not null`.
        negated: bool,
    },
    /// Parenthesized group of predicates.
    Nested {
        /// Connective.
        boolean: Boolean,
        /// Group members.
        wheres: Vec<WhereClause>,
    },
    /// Verbatim SQL with its own bindings.
    Raw {
        /// Connective.
        boolean: Boolean,
        /// SQL fragment.
        sql: String,
        /// Values for the fragment's placeholders.
        bindings: Vec<SqlValue>,
    },
    /// `column [not] in (select …)`
    InSub {
        /// Connective.
        boolean: Boolean,
        /// Tested column.
        column: Column,
        /// Sub-select.
        query: Box<Query>,
        /// `not in`.
        negated: bool,
    },
    /// `[not] exists (select …)`
    Exists {
        /// Connective.
        boolean: Boolean,
        /// Sub-select.
        query: Box<Query>,
        /// `not exists`.
        negated: bool,
    },
    /// `column <op> (select …)`
    Sub {
        /// Connective.
        boolean: Boolean,
        /// Left-hand column.
        column: Column,
        /// Comparison operator.
        operator: String,
        /// Sub-select.
        query: Box<Query>,
    },
}

impl WhereClause {
    /// The connective of this node.
    #[must_use]
    pub const fn boolean(&self) -> Boolean {
        match self {
            Self::Basic { boolean, .. }
            | Self::Column { boolean, .. }
            | Self::Between { boolean, .. }
            | Self::In { boolean, .. }
            | Self::Null { boolean, .. }
            | Self::Nested { boolean, .. }
            | Self::Raw { boolean, .. }
            | Self::InSub { boolean, .. }
            | Self::Exists { boolean, .. }
            | Self::Sub { boolean, .. } => *boolean,
        }
    }
}

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// `inner join`
    Inner,
    /// `left join`
    Left,
    /// `right join`
    Right,
    /// `cross join`
    Cross,
}

impl JoinType {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Cross => "cross",
        }
    }
}

/// A join with its `on` predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Join kind.
    pub kind: JoinType,
    /// Joined table.
    pub table: Column,
    /// `on` predicates.
    pub wheres: Vec<WhereClause>,
}

impl JoinClause {
    /// Creates a join without conditions.
    #[must_use]
    pub fn new(kind: JoinType, table: impl Into<Column>) -> Self {
        Self {
            kind,
            table: table.into(),
            wheres: Vec::new(),
        }
    }

    /// Adds an `on first <op> second` condition.
    #[must_use]
    pub fn on(self, first: impl Into<Column>, operator: &str, second: impl Into<Column>) -> Self {
        self.push_on(Boolean::And, first, operator, second)
    }

    /// Adds an `or first <op> second` condition.
    #[must_use]
    pub fn or_on(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.push_on(Boolean::Or, first, operator, second)
    }

    /// Adds a `column <op> value` condition with a bound value.
    #[must_use]
    pub fn where_value(
        mut self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Param>,
    ) -> Self {
        self.wheres.push(WhereClause::Basic {
            boolean: Boolean::And,
            column: column.into(),
            operator: operator.to_string(),
            value: value.into(),
        });
        self
    }

    fn push_on(
        mut self,
        boolean: Boolean,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.wheres.push(WhereClause::Column {
            boolean,
            first: first.into(),
            operator: operator.to_string(),
            second: second.into(),
        });
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One `order by` item.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderClause {
    /// `column asc|desc`
    Column {
        /// Sorted column.
        column: Column,
        /// Direction.
        direction: Direction,
    },
    /// Verbatim ordering SQL.
    Raw {
        /// SQL fragment.
        sql: String,
        /// Values for the fragment's placeholders.
        bindings: Vec<SqlValue>,
    },
}

/// Row locking mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    /// Exclusive lock (`for update`).
    Update,
    /// Shared lock.
    Shared,
    /// Verbatim lock clause.
    Raw(String),
}

/// Aggregate function applied to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Function name (`count`, `max`, …).
    pub function: String,
    /// Aggregated columns; empty means `*`.
    pub columns: Vec<Column>,
}
