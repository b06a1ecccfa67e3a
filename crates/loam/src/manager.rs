//! Named connection configurations and their lazily opened connections.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::info;

use crate::config::ConnectionConfig;
use crate::connection::DatabaseConnection;
use crate::driver::DriverFactory;
use crate::error::{Error, Result};
use crate::log::{GlobalSequence, SequenceGenerator};

/// Name of the default connection unless changed.
pub const DEFAULT_CONNECTION: &str = "default";

/// Owns connection configurations and opens each connection on first use.
pub struct DatabaseManager {
    configs: BTreeMap<String, ConnectionConfig>,
    connections: HashMap<String, DatabaseConnection>,
    default: String,
    factory: Arc<dyn DriverFactory>,
    sequence: Arc<dyn SequenceGenerator>,
}

impl DatabaseManager {
    /// Creates a manager opening handles through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            configs: BTreeMap::new(),
            connections: HashMap::new(),
            default: DEFAULT_CONNECTION.to_string(),
            factory,
            sequence: Arc::new(GlobalSequence),
        }
    }

    /// Sequence shared by the query logs of every connection opened from
    /// now on.
    #[must_use]
    pub fn with_sequence(mut self, sequence: Arc<dyn SequenceGenerator>) -> Self {
        self.sequence = sequence;
        self
    }

    /// Registers or replaces a configuration. An open connection of the
    /// same name keeps its old configuration until reconnected.
    pub fn add_connection(&mut self, name: &str, config: ConnectionConfig) {
        self.configs.insert(name.to_string(), config);
    }

    /// Forgets a configuration and closes its connection.
    pub fn remove_connection(&mut self, name: &str) -> Option<ConnectionConfig> {
        self.purge(name);
        self.configs.remove(name)
    }

    /// Configuration registered under `name`.
    #[must_use]
    pub fn config(&self, name: &str) -> Option<&ConnectionConfig> {
        self.configs.get(name)
    }

    /// Registered configuration names, sorted.
    #[must_use]
    pub fn connection_names(&self) -> Vec<&str> {
        self.configs.keys().map(String::as_str).collect()
    }

    /// Default connection name.
    #[must_use]
    pub fn default_connection(&self) -> &str {
        &self.default
    }

    /// Changes the default connection name.
    pub fn set_default_connection(&mut self, name: &str) {
        self.default = name.to_string();
    }

    /// Whether a connection is open under `name`.
    #[must_use]
    pub fn is_open(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// The connection `name` (the default one for `None`), opened on first
    /// use.
    pub fn connection(&mut self, name: Option<&str>) -> Result<&mut DatabaseConnection> {
        let name = name.unwrap_or(self.default.as_str()).to_string();
        if !self.connections.contains_key(&name) {
            let connection = self.make_connection(&name)?;
            self.connections.insert(name.clone(), connection);
        }
        self.connections
            .get_mut(&name)
            .ok_or_else(|| not_configured(&name))
    }

    /// Closes the physical handle of `name`; the connection reopens on its
    /// next statement.
    pub fn disconnect(&mut self, name: Option<&str>) {
        let name = name.unwrap_or(self.default.as_str()).to_string();
        if let Some(connection) = self.connections.get_mut(&name) {
            connection.disconnect();
        }
    }

    /// Reconnects `name`, opening it when it was never opened.
    pub fn reconnect(&mut self, name: Option<&str>) -> Result<&mut DatabaseConnection> {
        let name = name.unwrap_or(self.default.as_str()).to_string();
        if let Some(connection) = self.connections.get_mut(&name) {
            connection.reconnect()?;
        }
        self.connection(Some(&name))
    }

    /// Closes and forgets the connection `name`. Its configuration stays.
    pub fn purge(&mut self, name: &str) {
        if let Some(mut connection) = self.connections.remove(name) {
            connection.disconnect();
        }
    }

    fn make_connection(&self, name: &str) -> Result<DatabaseConnection> {
        let config = self.configs.get(name).ok_or_else(|| not_configured(name))?;
        let connection = DatabaseConnection::open(name, config, Arc::clone(&self.factory))?
            .with_sequence(Arc::clone(&self.sequence));
        info!(connection = name, driver = %connection.driver(), "Connection ready");
        Ok(connection)
    }
}

fn not_configured(name: &str) -> Error {
    Error::configuration(format!("database connection [{name}] not configured"))
}

impl std::fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseManager")
            .field("configs", &self.configs.keys())
            .field("open", &self.connections.keys())
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
