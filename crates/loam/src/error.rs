//! Error types for connections and statement execution.

use loam_core::{CompileError, Driver, SqlValue};
use thiserror::Error;

use crate::driver::DriverError;

/// Errors raised by connectors, connections and the schema builder.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed configuration, detected before any connection attempt.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Opening the physical connection or its session setup failed.
    #[error("connection [{connection}] failed: {message}")]
    Connection {
        /// Logical connection name.
        connection: String,
        /// What failed.
        message: String,
        /// Driver error, when there is one.
        #[source]
        source: Option<DriverError>,
    },

    /// The statement could not be compiled for this dialect.
    #[error(transparent)]
    Compilation(#[from] CompileError),

    /// The driver rejected a statement.
    #[error("{} error: {source} (SQL: {sql})", .driver.dialect_name())]
    Execution {
        /// The SQL that failed.
        sql: String,
        /// Its bindings.
        bindings: Vec<SqlValue>,
        /// Dialect of the connection.
        driver: Driver,
        /// Driver error.
        #[source]
        source: DriverError,
    },
}

impl Error {
    /// Shorthand for [`Error::Configuration`].
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type alias for connection operations.
pub type Result<T> = std::result::Result<T, Error>;
