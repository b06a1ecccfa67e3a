//! Connectors: open a physical connection for one dialect and configure
//! its session.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::{strict_modes, MySqlConnector, MYSQL_STRICT_MODES};
pub use postgres::PostgresConnector;
pub use sqlite::SqliteConnector;

use std::sync::Arc;

use loam_core::{Driver, Row, SqlValue};
use tracing::{debug, info};

use crate::config::{keys, ConnectionConfig};
use crate::driver::{ConnectParams, DriverError, DriverFactory, PhysicalConnection};
use crate::error::{Error, Result};
use crate::options::{ConfigurationOptionsParser, OptionsMap};

/// Opens and configures physical connections for one dialect.
pub trait Connector: Send + Sync {
    /// Dialect handled by this connector.
    fn driver(&self) -> Driver;

    /// Opens a handle for the connection `name` and runs its session setup.
    ///
    /// A setup failure releases the handle before the error is returned.
    fn connect(&self, name: &str, config: &ConnectionConfig) -> Result<Box<dyn PhysicalConnection>>;

    /// Options every connection gets unless the user sets them.
    fn connector_options(&self) -> OptionsMap {
        OptionsMap::new()
    }

    /// Adjusts or rejects the user's options.
    fn parse_config_options(
        &self,
        _config: &ConnectionConfig,
        _options: &mut OptionsMap,
    ) -> Result<()> {
        Ok(())
    }
}

/// Returns the connector for `driver`, opening handles through `factory`.
#[must_use]
pub fn connector_for(driver: Driver, factory: Arc<dyn DriverFactory>) -> Box<dyn Connector> {
    match driver {
        Driver::MySql => Box::new(MySqlConnector::new(factory)),
        Driver::Postgres => Box::new(PostgresConnector::new(factory)),
        Driver::Sqlite => Box::new(SqliteConnector::new(factory)),
    }
}

/// Resolves the driver parameters for `config`.
fn connect_params(
    connector: &dyn Connector,
    config: &ConnectionConfig,
) -> Result<ConnectParams> {
    let options = ConfigurationOptionsParser::new(connector).parse_configuration(config)?;
    Ok(ConnectParams {
        driver: connector.driver(),
        host: config.get_text(keys::HOST),
        port: config.port(),
        database: config.database().to_string(),
        username: config.get_text(keys::USERNAME),
        password: config.get_text(keys::PASSWORD),
        options,
    })
}

/// A handle whose session is still being configured.
///
/// Dropping it without calling [`Session::finish`] releases the handle.
struct Session<'a> {
    name: &'a str,
    handle: Box<dyn PhysicalConnection>,
}

impl<'a> Session<'a> {
    fn open(
        connector: &dyn Connector,
        factory: &dyn DriverFactory,
        name: &'a str,
        config: &ConnectionConfig,
    ) -> Result<Self> {
        let params = connect_params(connector, config)?;
        let handle = factory.open(&params).map_err(|source| Error::Connection {
            connection: name.to_string(),
            message: source.message.clone(),
            source: Some(source),
        })?;
        Ok(Self { name, handle })
    }

    fn run(&mut self, step: &str, sql: &str) -> Result<()> {
        debug!(connection = self.name, step, sql, "Session setup");
        self.handle
            .execute(sql, &[])
            .map(drop)
            .map_err(|source| self.failed(step, source))
    }

    fn query(&mut self, step: &str, sql: &str) -> Result<Vec<Row>> {
        debug!(connection = self.name, step, sql, "Session setup");
        self.handle
            .select(sql, &[])
            .map_err(|source| self.failed(step, source))
    }

    fn failed(&self, step: &str, source: DriverError) -> Error {
        Error::Connection {
            connection: self.name.to_string(),
            message: format!("session setup failed at {step}"),
            source: Some(source),
        }
    }

    fn finish(self) -> Box<dyn PhysicalConnection> {
        info!(connection = self.name, "Connection opened");
        self.handle
    }
}

/// First column of the first row, as text.
fn first_text(rows: &[Row]) -> Option<String> {
    rows.first()
        .and_then(|row| row.get_index(0))
        .and_then(|value| match value {
            SqlValue::Null => None,
            value => Some(value.to_string()),
        })
}
