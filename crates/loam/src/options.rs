//! Normalization of the `options` configuration key into one canonical
//! `key=value;key=value` string.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::{keys, ConnectionConfig};
use crate::connectors::Connector;
use crate::error::{Error, Result};

/// Normalized driver options, sorted by key.
pub type OptionsMap = BTreeMap<String, String>;

/// Turns user options into the option string handed to the driver.
///
/// The pipeline is: normalize the `options` value to a mapping, let the
/// connector adjust it, add the connector's defaults for absent keys, then
/// serialize.
pub struct ConfigurationOptionsParser<'a> {
    connector: &'a dyn Connector,
}

impl<'a> ConfigurationOptionsParser<'a> {
    /// Creates a parser for one connector.
    #[must_use]
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self { connector }
    }

    /// Normalized, adjusted and defaulted options.
    pub fn parse_options(&self, config: &ConnectionConfig) -> Result<OptionsMap> {
        let mut options = normalize_options(config.get(keys::OPTIONS))?;
        self.connector.parse_config_options(config, &mut options)?;
        merge_defaults(&mut options, self.connector.connector_options());
        Ok(options)
    }

    /// The canonical option string.
    pub fn parse_configuration(&self, config: &ConnectionConfig) -> Result<String> {
        Ok(serialize_options(&self.parse_options(config)?))
    }
}

/// Normalizes the raw `options` value. Absent or null yields an empty map.
pub fn normalize_options(raw: Option<&Value>) -> Result<OptionsMap> {
    match raw {
        None | Some(Value::Null) => Ok(OptionsMap::new()),
        Some(Value::String(options)) => parse_option_string(options),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| Ok((key.trim().to_string(), scalar_text(key, value)?)))
            .collect(),
        Some(other) => Err(Error::configuration(format!(
            "options must be a string or a mapping, got {other}"
        ))),
    }
}

/// Parses `key=value;key=value`. Empty parts are skipped; each part splits
/// on its first `=`.
pub fn parse_option_string(options: &str) -> Result<OptionsMap> {
    options
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| {
                    Error::configuration(format!("option '{part}' is not of the form key=value"))
                })
        })
        .collect()
}

/// Inserts each default whose key is absent.
pub fn merge_defaults(options: &mut OptionsMap, defaults: OptionsMap) {
    for (key, value) in defaults {
        options.entry(key).or_insert(value);
    }
}

/// `key=value` pairs joined by `;`, in key order.
#[must_use]
pub fn serialize_options(options: &OptionsMap) -> String {
    options
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn scalar_text(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::configuration(format!(
            "option '{key}' must be a string, number or boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_string_and_mapping_agree() {
        let from_string = normalize_options(Some(&json!("a=1; b = two ;;c=x=y"))).unwrap();
        let from_map = normalize_options(Some(&json!({"a": 1, "b": "two", "c": "x=y"}))).unwrap();
        assert_eq!(from_string, from_map);
        assert_eq!(serialize_options(&from_string), "a=1;b=two;c=x=y");
    }

    #[test]
    fn test_booleans_render_as_words() {
        let options = normalize_options(Some(&json!({"compress": true}))).unwrap();
        assert_eq!(serialize_options(&options), "compress=true");
    }

    #[test]
    fn test_rejects_malformed_options() {
        assert!(matches!(
            normalize_options(Some(&json!("novalue"))),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            normalize_options(Some(&json!([1, 2]))),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            normalize_options(Some(&json!({"nested": {"a": 1}}))),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_defaults_never_overwrite() {
        let mut options = parse_option_string("MYSQL_OPT_RECONNECT=1;SSL_MODE=REQUIRED").unwrap();
        merge_defaults(
            &mut options,
            OptionsMap::from([(String::from("MYSQL_OPT_RECONNECT"), String::from("0"))]),
        );
        assert_eq!(
            serialize_options(&options),
            "MYSQL_OPT_RECONNECT=1;SSL_MODE=REQUIRED"
        );
    }

    #[test]
    fn test_absent_options_are_empty() {
        assert!(normalize_options(None).unwrap().is_empty());
        assert!(normalize_options(Some(&Value::Null)).unwrap().is_empty());
        assert_eq!(serialize_options(&OptionsMap::new()), "");
    }
}
