//! Named connections opened on demand.

mod common;
use common::*;

use std::sync::Arc;

use loam::driver::RecordingDriver;
use loam::{ConnectionConfig, DatabaseManager, Error, LocalSequence};
use loam_core::Driver;

fn manager(driver: &RecordingDriver) -> DatabaseManager {
    let mut manager = DatabaseManager::new(Arc::new(driver.clone()));
    manager.add_connection("default", sqlite_memory());
    manager.add_connection("mysql", mysql_config().with("strict", false));
    manager
}

#[test]
fn connections_open_on_first_use() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver);
    assert!(!manager.is_open("default"));
    assert_eq!(driver.opened(), 0);

    manager.connection(None).unwrap();
    manager.connection(Some("default")).unwrap();

    assert!(manager.is_open("default"));
    assert_eq!(driver.opened(), 1);
}

#[test]
fn default_connection_can_change() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver);
    manager.set_default_connection("mysql");

    let connection = manager.connection(None).unwrap();

    assert_eq!(connection.name(), "mysql");
    assert_eq!(connection.driver(), Driver::MySql);
    assert_eq!(manager.default_connection(), "mysql");
    assert_eq!(manager.connection_names(), vec!["default", "mysql"]);
}

#[test]
fn unknown_connection_is_a_configuration_error() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver);

    let err = manager.connection(Some("analytics")).unwrap_err();

    assert!(matches!(err, Error::Configuration(ref message) if message.contains("analytics")));
}

#[test]
fn unknown_driver_is_a_configuration_error() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver);
    manager.add_connection("odbc", ConnectionConfig::for_driver("odbc"));

    let err = manager.connection(Some("odbc")).unwrap_err();

    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(driver.opened(), 0);
}

#[test]
fn disconnect_then_reuse_reconnects() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver);
    manager.connection(Some("mysql")).unwrap();

    manager.disconnect(Some("mysql"));
    assert_eq!(driver.live_handles(), 0);

    manager
        .connection(Some("mysql"))
        .unwrap()
        .statement("select 1", &[])
        .unwrap();

    assert_eq!(driver.opened(), 2);
    assert_eq!(
        driver.sql_log(),
        vec![
            "set session sql_mode='NO_ENGINE_SUBSTITUTION'",
            "set session sql_mode='NO_ENGINE_SUBSTITUTION'",
            "select 1",
        ]
    );
}

#[test]
fn reconnect_reruns_session_setup() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver);
    manager.connection(Some("mysql")).unwrap();

    manager.reconnect(Some("mysql")).unwrap();

    assert_eq!(driver.opened(), 2);
    assert_eq!(driver.live_handles(), 1);
    assert_eq!(driver.sql_log().len(), 2);
}

#[test]
fn removing_a_connection_closes_it() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver);
    manager.connection(None).unwrap();

    let removed = manager.remove_connection("default");

    assert!(removed.is_some());
    assert!(!manager.is_open("default"));
    assert!(manager.config("default").is_none());
    assert_eq!(driver.live_handles(), 0);
}

#[test]
fn connections_share_the_manager_sequence() {
    let driver = RecordingDriver::new();
    let mut manager = manager(&driver).with_sequence(Arc::new(LocalSequence::new()));

    for name in ["default", "mysql", "default"] {
        let connection = manager.connection(Some(name)).unwrap();
        connection.enable_query_log();
        connection.statement("select 1", &[]).unwrap();
    }

    let default: Vec<u64> = manager
        .connection(Some("default"))
        .unwrap()
        .query_log()
        .iter()
        .map(|entry| entry.order)
        .collect();
    let mysql: Vec<u64> = manager
        .connection(Some("mysql"))
        .unwrap()
        .query_log()
        .iter()
        .map(|entry| entry.order)
        .collect();

    assert_eq!(default, vec![1, 3]);
    assert_eq!(mysql, vec![2]);
}
