//! MySQL connector.

use std::sync::{Arc, LazyLock};

use loam_core::Driver;
use regex::Regex;
use serde_json::Value;

use crate::config::{keys, ConnectionConfig};
use crate::driver::{DriverFactory, PhysicalConnection};
use crate::error::{Error, Result};
use crate::options::OptionsMap;

use super::{first_text, Connector, Session};

/// `sql_mode` for strict connections on current servers.
pub const MYSQL_STRICT_MODES: &str = "ONLY_FULL_GROUP_BY,STRICT_TRANS_TABLES,NO_ZERO_IN_DATE,\
NO_ZERO_DATE,ERROR_FOR_DIVISION_BY_ZERO,NO_ENGINE_SUBSTITUTION";

const LEGACY_STRICT_MODES: &str = "ONLY_FULL_GROUP_BY,STRICT_TRANS_TABLES,NO_ZERO_IN_DATE,\
NO_ZERO_DATE,ERROR_FOR_DIVISION_BY_ZERO,NO_AUTO_CREATE_USER,NO_ENGINE_SUBSTITUTION";

/// First server version without `NO_AUTO_CREATE_USER`.
const NO_AUTO_CREATE_USER_REMOVED: (u32, u32, u32) = (8, 0, 11);

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("Invalid version regex"));

/// Opens MySQL connections.
pub struct MySqlConnector {
    factory: Arc<dyn DriverFactory>,
}

impl MySqlConnector {
    /// Creates a connector opening handles through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self { factory }
    }

    fn configure_encoding(session: &mut Session<'_>, config: &ConnectionConfig) -> Result<()> {
        let Some(charset) = config.get_str(keys::CHARSET) else {
            return Ok(());
        };
        let sql = match config.get_str(keys::COLLATION) {
            Some(collation) => format!("set names '{charset}' collate '{collation}'"),
            None => format!("set names '{charset}'"),
        };
        session.run("charset", &sql)
    }

    fn configure_modes(session: &mut Session<'_>, config: &ConnectionConfig) -> Result<()> {
        if let Some(modes) = modes(config)? {
            return session.run("modes", &format!("set session sql_mode='{modes}'"));
        }
        match config.get_bool(keys::STRICT) {
            Some(true) => {
                let rows = session.query("server version", "select version()")?;
                let version = first_text(&rows).unwrap_or_default();
                session.run(
                    "modes",
                    &format!("set session sql_mode='{}'", strict_modes(&version)),
                )
            }
            Some(false) => session.run("modes", "set session sql_mode='NO_ENGINE_SUBSTITUTION'"),
            None => Ok(()),
        }
    }
}

impl Connector for MySqlConnector {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn connect(&self, name: &str, config: &ConnectionConfig) -> Result<Box<dyn PhysicalConnection>> {
        let mut session = Session::open(self, self.factory.as_ref(), name, config)?;

        Self::configure_encoding(&mut session, config)?;
        if let Some(timezone) = config.get_str(keys::TIMEZONE) {
            session.run("timezone", &format!("set time_zone=\"{timezone}\""))?;
        }
        if let Some(level) = config.get_str(keys::ISOLATION_LEVEL) {
            session.run(
                "isolation level",
                &format!("SET SESSION TRANSACTION ISOLATION LEVEL {level}"),
            )?;
        }
        Self::configure_modes(&mut session, config)?;

        Ok(session.finish())
    }

    fn connector_options(&self) -> OptionsMap {
        OptionsMap::from([(String::from("MYSQL_OPT_RECONNECT"), String::from("0"))])
    }
}

/// Explicit `modes`, comma joined.
fn modes(config: &ConnectionConfig) -> Result<Option<String>> {
    match config.get(keys::MODES) {
        None => Ok(None),
        Some(Value::String(modes)) => Ok(Some(modes.clone())),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(ToString::to_string)
                    .ok_or_else(|| Error::configuration("'modes' must contain only strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(|modes| Some(modes.join(","))),
        Some(_) => Err(Error::configuration(
            "'modes' must be a string or an array of strings",
        )),
    }
}

/// The strict `sql_mode` for a server reporting `version`.
///
/// Versions that cannot be parsed are treated as current servers.
#[must_use]
pub fn strict_modes(version: &str) -> &'static str {
    let parsed = VERSION.captures(version).and_then(|captures| {
        let part = |index: usize| captures.get(index)?.as_str().parse::<u32>().ok();
        Some((part(1)?, part(2)?, part(3)?))
    });
    match parsed {
        Some(version) if version < NO_AUTO_CREATE_USER_REMOVED => LEGACY_STRICT_MODES,
        _ => MYSQL_STRICT_MODES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_modes_by_version() {
        assert_eq!(strict_modes("5.7.44-log"), LEGACY_STRICT_MODES);
        assert_eq!(strict_modes("8.0.10"), LEGACY_STRICT_MODES);
        assert_eq!(strict_modes("8.0.11"), MYSQL_STRICT_MODES);
        assert_eq!(strict_modes("10.11.2-MariaDB"), MYSQL_STRICT_MODES);
        assert_eq!(strict_modes("unknown"), MYSQL_STRICT_MODES);
    }

    #[test]
    fn test_modes_accept_string_or_list() {
        let config = ConnectionConfig::new().with(keys::MODES, vec!["A", "B"]);
        assert_eq!(modes(&config).unwrap(), Some(String::from("A,B")));

        let config = ConnectionConfig::new().with(keys::MODES, "A");
        assert_eq!(modes(&config).unwrap(), Some(String::from("A")));

        let config = ConnectionConfig::new().with(keys::MODES, 3);
        assert!(modes(&config).is_err());
    }
}
