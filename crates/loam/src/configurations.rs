//! Driver-specific validation and normalization of a connection
//! configuration, run once before connecting.

use loam_core::Driver;
use serde_json::Value;

use crate::config::{keys, ConnectionConfig};
use crate::error::{Error, Result};

/// Tables PostgreSQL's `drop_all_tables` keeps when `dont_drop` is unset.
pub const DEFAULT_DONT_DROP: &[&str] = &["spatial_ref_sys"];

/// Validates `config` for `driver` and returns the normalized copy.
///
/// PostgreSQL rejects the `schema` key, and normalizes `search_path` and
/// `dont_drop` to string arrays (`dont_drop` defaulting to
/// [`DEFAULT_DONT_DROP`]). The other drivers take the configuration as is.
pub fn parse_driver_config(driver: Driver, config: &ConnectionConfig) -> Result<ConnectionConfig> {
    let mut config = config.clone();
    if driver == Driver::Postgres {
        if config.contains(keys::SCHEMA) {
            return Err(Error::configuration(
                "the 'schema' option is not supported on PostgreSQL, use 'search_path'",
            ));
        }
        if let Some(search_path) = string_list(&config, keys::SEARCH_PATH)? {
            config.set(keys::SEARCH_PATH, search_path);
        }
        let dont_drop = string_list(&config, keys::DONT_DROP)?.unwrap_or_else(|| {
            DEFAULT_DONT_DROP.iter().map(ToString::to_string).collect()
        });
        config.set(keys::DONT_DROP, dont_drop);
    }
    Ok(config)
}

/// Configured search path schemas, in order.
#[must_use]
pub fn search_path(config: &ConnectionConfig) -> Vec<String> {
    string_list(config, keys::SEARCH_PATH)
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Tables excluded from `drop_all_tables`.
#[must_use]
pub fn dont_drop(config: &ConnectionConfig) -> Vec<String> {
    string_list(config, keys::DONT_DROP)
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Reads a string or string array. A string is split on commas, each part
/// trimmed of whitespace and double quotes.
fn string_list(config: &ConnectionConfig, key: &str) -> Result<Option<Vec<String>>> {
    let invalid = || Error::configuration(format!("'{key}' must be a string or an array of strings"));
    match config.get(key) {
        None => Ok(None),
        Some(Value::String(list)) => Ok(Some(
            list.split(',')
                .map(|part| part.trim().trim_matches('"').trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
        )),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pgsql() -> ConnectionConfig {
        ConnectionConfig::for_driver("pgsql")
    }

    #[test]
    fn test_schema_key_is_rejected() {
        let config = pgsql().with("schema", "public");
        assert!(matches!(
            parse_driver_config(Driver::Postgres, &config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_search_path_string_is_split() {
        let config = pgsql().with("search_path", "\"app\", public");
        let parsed = parse_driver_config(Driver::Postgres, &config).unwrap();
        assert_eq!(search_path(&parsed), vec!["app", "public"]);
    }

    #[test]
    fn test_dont_drop_defaults() {
        let parsed = parse_driver_config(Driver::Postgres, &pgsql()).unwrap();
        assert_eq!(dont_drop(&parsed), vec!["spatial_ref_sys"]);
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        let config = pgsql().with("dont_drop", 5);
        assert!(parse_driver_config(Driver::Postgres, &config).is_err());
        let config = pgsql().with("search_path", json!(["a", 1]));
        assert!(parse_driver_config(Driver::Postgres, &config).is_err());
    }

    #[test]
    fn test_other_drivers_are_untouched() {
        let config = ConnectionConfig::for_driver("mysql").with("schema", "x");
        assert_eq!(parse_driver_config(Driver::MySql, &config).unwrap(), config);
    }
}
