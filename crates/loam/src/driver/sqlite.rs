//! SQLite driver backed by sqlx.
//!
//! sqlx is async; each handle owns a current-thread tokio runtime and
//! blocks on every call, so the rest of the crate stays synchronous.

use std::str::FromStr;
use std::time::Duration;

use loam_core::{Row, SqlValue};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row as _, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

use super::{ConnectParams, DriverError, DriverFactory, PhysicalConnection, StatementResult};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Opens SQLite databases through sqlx.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    /// Creates the driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn connect_options(params: &ConnectParams) -> Result<SqliteConnectOptions, DriverError> {
        let mut options = if params.database == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&params.database)
                .create_if_missing(true)
        };
        // Enforcement is left to the connector's pragma.
        options = options.foreign_keys(false);

        for part in params.options.split(';').filter(|part| !part.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            match key {
                "busy_timeout" => {
                    let millis = value.parse::<u64>().map_err(|_| {
                        DriverError::new(format!("invalid busy_timeout '{value}'"))
                    })?;
                    options = options.busy_timeout(Duration::from_millis(millis));
                }
                "read_only" => {
                    options = options.read_only(matches!(value, "1" | "true"));
                }
                _ => warn!(option = key, "Ignoring unsupported SQLite option"),
            }
        }
        Ok(options)
    }
}

impl DriverFactory for SqliteDriver {
    fn open(&self, params: &ConnectParams) -> Result<Box<dyn PhysicalConnection>, DriverError> {
        let options = Self::connect_options(params)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DriverError::new(format!("failed to start runtime: {e}")))?;
        let connection = runtime.block_on(SqliteConnection::connect_with(&options))?;
        Ok(Box::new(SqliteHandle {
            runtime,
            connection,
        }))
    }
}

struct SqliteHandle {
    runtime: Runtime,
    connection: SqliteConnection,
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

fn bind_all<'q>(sql: &'q str, bindings: &[SqlValue]) -> SqliteQuery<'q> {
    let mut query = sqlx::query(sql);
    for value in bindings {
        query = match value {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::UInt(n) => match i64::try_from(*n) {
                Ok(n) => query.bind(n),
                Err(_) => query.bind(n.to_string()),
            },
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Blob(bytes) => query.bind(bytes.clone()),
            SqlValue::DateTime(dt) => query.bind(dt.format(DATETIME_FORMAT).to_string()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> Result<Row, DriverError> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" => SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
                "TEXT" => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
                "BLOB" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
                _ => SqlValue::Null,
            }
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}

impl PhysicalConnection for SqliteHandle {
    fn select(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>, DriverError> {
        let rows = self
            .runtime
            .block_on(bind_all(sql, bindings).fetch_all(&mut self.connection))?;
        rows.iter().map(decode_row).collect()
    }

    fn execute(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<StatementResult, DriverError> {
        let result = self
            .runtime
            .block_on(bind_all(sql, bindings).execute(&mut self.connection))?;
        Ok(StatementResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    fn execute_unprepared(&mut self, sql: &str) -> Result<(), DriverError> {
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut self.connection))?;
        Ok(())
    }
}
