//! SQL values, raw expressions and statement parameters.
//!
//! Values never reach the SQL text; grammars emit a `?` placeholder and push
//! the value onto the binding list. Raw [`Expression`]s are the only way to
//! put caller-provided text into a statement verbatim.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// A SQL value that can be bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value that does not fit in `i64`.
    UInt(u64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Date and time without a timezone.
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i64` when it is an integer that fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::UInt(n) => i64::try_from(*n).ok(),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Used for schema defaults, where DDL cannot take placeholders.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => n.to_string(),
            Self::UInt(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::UInt(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

macro_rules! impl_to_sql_value {
    ($variant:ident <- $($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::$variant(self.into())
                }
            }
        )+
    };
}

impl_to_sql_value!(Int <- i64, i32, i16, i8, u32, u16, u8);
impl_to_sql_value!(Float <- f64, f32);
impl_to_sql_value!(Bool <- bool);
impl_to_sql_value!(Text <- String, &str);
impl_to_sql_value!(Blob <- Vec<u8>);
impl_to_sql_value!(DateTime <- NaiveDateTime);

impl ToSqlValue for u64 {
    fn to_sql_value(self) -> SqlValue {
        i64::try_from(self).map_or(SqlValue::UInt(self), SqlValue::Int)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

macro_rules! impl_sql_value_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    value.to_sql_value()
                }
            }
        )+
    };
}

impl_sql_value_from!(
    i64, i32, i16, i8, u64, u32, u16, u8, f64, f32, bool, String, &str, Vec<u8>, NaiveDateTime
);

impl<T: ToSqlValue> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.to_sql_value()
    }
}

/// A raw SQL fragment, emitted verbatim and never quoted or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    /// Creates a raw expression.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// Returns the raw SQL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`Expression::new`].
#[must_use]
pub fn raw(sql: impl Into<String>) -> Expression {
    Expression::new(sql)
}

/// A statement parameter: either a bound value or a raw expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Bound through a placeholder.
    Value(SqlValue),
    /// Emitted verbatim, contributes no binding.
    Raw(Expression),
}

impl From<Expression> for Param {
    fn from(expression: Expression) -> Self {
        Self::Raw(expression)
    }
}

macro_rules! impl_param_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Self::Value(value.to_sql_value())
                }
            }
        )+
    };
}

impl_param_from!(
    SqlValue, i64, i32, i16, i8, u64, u32, u16, u8, f64, f32, bool, String, &str, Vec<u8>,
    NaiveDateTime
);

impl<T: ToSqlValue> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        Self::Value(value.to_sql_value())
    }
}
