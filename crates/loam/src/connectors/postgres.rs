//! PostgreSQL connector.

use std::sync::Arc;

use loam_core::Driver;

use crate::config::{keys, ConnectionConfig};
use crate::configurations::search_path;
use crate::driver::{DriverFactory, PhysicalConnection};
use crate::error::Result;
use crate::options::OptionsMap;

use super::{Connector, Session};

/// Top-level keys copied into the driver options.
const SSL_KEYS: [&str; 4] = [keys::SSLMODE, keys::SSLCERT, keys::SSLKEY, keys::SSLROOTCERT];

/// Opens PostgreSQL connections.
pub struct PostgresConnector {
    factory: Arc<dyn DriverFactory>,
}

impl PostgresConnector {
    /// Creates a connector opening handles through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self { factory }
    }
}

impl Connector for PostgresConnector {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn connect(&self, name: &str, config: &ConnectionConfig) -> Result<Box<dyn PhysicalConnection>> {
        let mut session = Session::open(self, self.factory.as_ref(), name, config)?;

        if let Some(charset) = config.get_str(keys::CHARSET) {
            session.run("charset", &format!("set names '{charset}'"))?;
        }
        if let Some(timezone) = config.get_str(keys::TIMEZONE) {
            session.run("timezone", &format!("set time zone '{timezone}'"))?;
        }
        if let Some(level) = config.get_str(keys::ISOLATION_LEVEL) {
            session.run(
                "isolation level",
                &format!("SET SESSION CHARACTERISTICS AS TRANSACTION ISOLATION LEVEL {level}"),
            )?;
        }
        let schemas = search_path(config);
        if !schemas.is_empty() {
            session.run("search path", &format!("set search_path to {}", quote_schemas(&schemas)))?;
        }
        if let Some(application) = config.get_str(keys::APPLICATION_NAME) {
            session.run(
                "application name",
                &format!("set application_name to '{application}'"),
            )?;
        }

        Ok(session.finish())
    }

    fn parse_config_options(&self, config: &ConnectionConfig, options: &mut OptionsMap) -> Result<()> {
        for key in SSL_KEYS {
            if let Some(value) = config.get_text(key) {
                options.insert(key.to_string(), value);
            }
        }
        Ok(())
    }
}

/// `"a", "b"`; `$user` stays bare.
fn quote_schemas(schemas: &[String]) -> String {
    schemas
        .iter()
        .map(|schema| {
            if schema == "$user" {
                schema.clone()
            } else {
                format!("\"{}\"", schema.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
