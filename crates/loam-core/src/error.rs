//! Error types for statement compilation.

use thiserror::Error;

/// Errors raised while compiling builder state into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The dialect cannot express the requested operation.
    #[error("{dialect} does not support {feature}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// The operation that was requested.
        feature: String,
    },

    /// A comparison operator the dialect does not know.
    #[error("invalid operator '{operator}' for {dialect}")]
    InvalidOperator {
        /// The rejected operator.
        operator: String,
        /// Dialect name.
        dialect: &'static str,
    },

    /// The statement needs a target table.
    #[error("no table specified for {0} statement")]
    MissingTable(&'static str),

    /// An insert, update or upsert without any columns.
    #[error("no values given for {0} statement")]
    EmptyValues(&'static str),

    /// Rows of a multi-row insert disagree on their column set.
    #[error("insert rows disagree on column '{0}'")]
    RecordMismatch(String),

    /// Placeholder count does not match the binding count.
    #[error("statement has {placeholders} placeholders but {bindings} bindings: {sql}")]
    BindingMismatch {
        /// The offending SQL.
        sql: String,
        /// Placeholders found in the SQL text.
        placeholders: usize,
        /// Values bound.
        bindings: usize,
    },
}

/// Returned when a driver name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported driver '{0}'")]
pub struct UnknownDriver(pub String);

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
