//! Connection configuration.
//!
//! A [`ConnectionConfig`] is a JSON-shaped mapping. Recognized keys are listed
//! in [`keys`]; everything else passes through untouched and stays readable
//! by drivers.

use std::str::FromStr;

use loam_core::Driver;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Recognized configuration keys.
pub mod keys {
    /// Driver name (`mysql`, `pgsql`, `sqlite`, …).
    pub const DRIVER: &str = "driver";
    /// Server host.
    pub const HOST: &str = "host";
    /// Server port.
    pub const PORT: &str = "port";
    /// Database name, or file path for SQLite.
    pub const DATABASE: &str = "database";
    /// User name.
    pub const USERNAME: &str = "username";
    /// Password.
    pub const PASSWORD: &str = "password";
    /// Connection character set.
    pub const CHARSET: &str = "charset";
    /// Connection collation.
    pub const COLLATION: &str = "collation";
    /// Session time zone.
    pub const TIMEZONE: &str = "timezone";
    /// Table prefix.
    pub const PREFIX: &str = "prefix";
    /// Also prefix generated index names.
    pub const PREFIX_INDEXES: &str = "prefix_indexes";
    /// MySQL strict mode.
    pub const STRICT: &str = "strict";
    /// Explicit MySQL `sql_mode` list.
    pub const MODES: &str = "modes";
    /// Session transaction isolation level.
    pub const ISOLATION_LEVEL: &str = "isolation_level";
    /// MySQL storage engine for created tables.
    pub const ENGINE: &str = "engine";
    /// PostgreSQL search path.
    pub const SEARCH_PATH: &str = "search_path";
    /// PostgreSQL tables kept by `drop_all_tables`.
    pub const DONT_DROP: &str = "dont_drop";
    /// PostgreSQL application name.
    pub const APPLICATION_NAME: &str = "application_name";
    /// Rejected on PostgreSQL; use `search_path`.
    pub const SCHEMA: &str = "schema";
    /// SQLite foreign key enforcement.
    pub const FOREIGN_KEY_CONSTRAINTS: &str = "foreign_key_constraints";
    /// SQLite: require the database file to exist.
    pub const CHECK_DATABASE_EXISTS: &str = "check_database_exists";
    /// Driver options, as a `k=v;k=v` string or a mapping.
    pub const OPTIONS: &str = "options";
    /// PostgreSQL TLS mode.
    pub const SSLMODE: &str = "sslmode";
    /// PostgreSQL client certificate.
    pub const SSLCERT: &str = "sslcert";
    /// PostgreSQL client key.
    pub const SSLKEY: &str = "sslkey";
    /// PostgreSQL root certificate.
    pub const SSLROOTCERT: &str = "sslrootcert";
}

/// Configuration of one logical connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionConfig(Map<String, Value>);

impl ConnectionConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for `driver`.
    #[must_use]
    pub fn for_driver(driver: &str) -> Self {
        Self::new().with(keys::DRIVER, driver)
    }

    /// Parses a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid connection configuration: {e}")))
    }

    /// Sets a key and returns the configuration.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Removes a key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Raw value of a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// True when the key is set to a non-null value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String value of a key; numbers are not coerced.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Boolean value of a key. Accepts JSON booleans, `0`/`1` and the
    /// strings `true`/`false`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Scalar value rendered as text.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The configured driver.
    pub fn driver(&self) -> Result<Driver> {
        let name = self
            .get_str(keys::DRIVER)
            .ok_or_else(|| Error::configuration("a driver must be specified"))?;
        Driver::from_str(name).map_err(|e| Error::configuration(e.to_string()))
    }

    /// Database name (file path for SQLite); empty when unset.
    #[must_use]
    pub fn database(&self) -> &str {
        self.get_str(keys::DATABASE).unwrap_or_default()
    }

    /// Table prefix; empty when unset.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.get_str(keys::PREFIX).unwrap_or_default()
    }

    /// Server port.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        match self.get(keys::PORT)? {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Underlying mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ConnectionConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
