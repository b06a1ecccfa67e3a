#![allow(dead_code)]

use std::sync::Arc;

use loam::driver::{RecordingDriver, SqliteDriver};
use loam::{ConnectionConfig, DatabaseConnection};
use loam_core::{Row, SqlValue};

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn mysql_config() -> ConnectionConfig {
    ConnectionConfig::for_driver("mysql")
        .with("host", "127.0.0.1")
        .with("port", 3306)
        .with("database", "app")
        .with("username", "root")
}

pub fn postgres_config() -> ConnectionConfig {
    ConnectionConfig::for_driver("pgsql")
        .with("host", "127.0.0.1")
        .with("database", "app")
        .with("username", "app")
}

pub fn sqlite_memory() -> ConnectionConfig {
    ConnectionConfig::for_driver("sqlite").with("database", ":memory:")
}

/// Opens a connection on the recording driver.
pub fn recorded(driver: &RecordingDriver, config: &ConnectionConfig) -> DatabaseConnection {
    DatabaseConnection::open("test", config, Arc::new(driver.clone()))
        .unwrap_or_else(|e| panic!("Failed to open connection: {e}"))
}

/// Opens an in-memory SQLite database.
pub fn sqlite_connection() -> DatabaseConnection {
    init_tracing();
    DatabaseConnection::open("sqlite", &sqlite_memory(), Arc::new(SqliteDriver::new()))
        .unwrap_or_else(|e| panic!("Failed to open SQLite: {e}"))
}

pub fn version_row(version: &str) -> Vec<Row> {
    vec![Row::new().with("version()", version)]
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}
