//! SQLite connector.

use std::path::Path;
use std::sync::Arc;

use loam_core::Driver;

use crate::config::{keys, ConnectionConfig};
use crate::driver::{DriverFactory, PhysicalConnection};
use crate::error::{Error, Result};

use super::{Connector, Session};

/// Opens SQLite databases.
pub struct SqliteConnector {
    factory: Arc<dyn DriverFactory>,
}

impl SqliteConnector {
    /// Creates a connector opening handles through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self { factory }
    }
}

impl Connector for SqliteConnector {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn connect(&self, name: &str, config: &ConnectionConfig) -> Result<Box<dyn PhysicalConnection>> {
        let database = config.database();
        if database.is_empty() {
            return Err(Error::configuration("a SQLite database path must be specified"));
        }
        let check_exists = config.get_bool(keys::CHECK_DATABASE_EXISTS).unwrap_or(true);
        if database != ":memory:" && check_exists && !Path::new(database).exists() {
            return Err(Error::configuration(format!(
                "SQLite database file '{database}' does not exist"
            )));
        }

        let mut session = Session::open(self, self.factory.as_ref(), name, config)?;
        if let Some(enabled) = config.get_bool(keys::FOREIGN_KEY_CONSTRAINTS) {
            let grammar = Driver::Sqlite.schema_grammar("");
            let pragma = if enabled {
                grammar.compile_enable_foreign_key_constraints()
            } else {
                grammar.compile_disable_foreign_key_constraints()
            };
            session.run("foreign keys", &pragma)?;
        }

        Ok(session.finish())
    }
}
