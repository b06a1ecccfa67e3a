//! The boundary between connections and physical database drivers.
//!
//! A [`DriverFactory`] opens [`PhysicalConnection`]s from resolved
//! [`ConnectParams`]. The crate bundles a sqlx-backed SQLite driver and a
//! [`RecordingDriver`] that records statements without a database.

mod recording;
mod sqlite;

pub use recording::{RecordedStatement, RecordingDriver};
pub use sqlite::SqliteDriver;

use loam_core::{Driver, Row, SqlValue};
use thiserror::Error;

/// Error reported by a physical driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    /// Driver message.
    pub message: String,
    /// Vendor error code, when the driver reports one.
    pub code: Option<String>,
}

impl DriverError {
    /// Creates an error without a vendor code.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attaches a vendor code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<sqlx::Error> for DriverError {
    fn from(error: sqlx::Error) -> Self {
        let code = error
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());
        Self {
            message: error.to_string(),
            code,
        }
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementResult {
    /// Rows changed by the statement.
    pub rows_affected: u64,
    /// Key generated by an insert, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

/// Everything a driver needs to open a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Dialect.
    pub driver: Driver,
    /// Server host.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Database name or SQLite file path.
    pub database: String,
    /// User name.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Canonical `key=value;key=value` option string.
    pub options: String,
}

/// An open physical connection.
pub trait PhysicalConnection: Send {
    /// Runs a query and returns its rows.
    fn select(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>, DriverError>;

    /// Runs a prepared statement that returns no rows.
    fn execute(&mut self, sql: &str, bindings: &[SqlValue])
        -> Result<StatementResult, DriverError>;

    /// Runs SQL without preparing it.
    fn execute_unprepared(&mut self, sql: &str) -> Result<(), DriverError>;
}

/// Opens physical connections.
pub trait DriverFactory: Send + Sync {
    /// Opens a connection.
    fn open(&self, params: &ConnectParams) -> Result<Box<dyn PhysicalConnection>, DriverError>;
}
