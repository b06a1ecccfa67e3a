//! Statement execution, the query log and pretend mode.

mod common;
use common::*;

use std::sync::Arc;

use loam::driver::{RecordedStatement, RecordingDriver};
use loam::{DatabaseConnection, Error, LocalSequence, SequenceGenerator};
use loam_core::{record, CompileError, Driver, Query, Row, SqlValue};

// ==================== Execution ====================

#[test]
fn select_sends_compiled_sql_and_bindings() {
    let driver = RecordingDriver::new();
    driver.push_response(vec![Row::new().with("id", 1).with("name", "ada")]);
    let mut connection = recorded(&driver, &sqlite_memory());

    let rows = connection
        .select(&Query::table("users").where_eq("id", 1))
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&text("ada")));
    assert_eq!(
        driver.statements(),
        vec![RecordedStatement {
            sql: String::from("select * from \"users\" where \"id\" = ?"),
            bindings: vec![SqlValue::Int(1)],
        }]
    );
}

#[test]
fn scalar_reads_first_column_of_first_row() {
    let driver = RecordingDriver::new();
    driver.push_response(vec![Row::new().with("aggregate", 3)]);
    let mut connection = recorded(&driver, &sqlite_memory());

    let value = connection.scalar(&Query::table("users")).unwrap();

    assert_eq!(value, Some(SqlValue::Int(3)));
    assert_eq!(driver.sql_log(), vec!["select * from \"users\" limit 1"]);
}

#[test]
fn select_one_on_empty_result() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    assert_eq!(connection.select_one(&Query::table("users")).unwrap(), None);
}

#[test]
fn writes_report_affected_rows() {
    let driver = RecordingDriver::new();
    driver.set_rows_affected(4);
    let mut connection = recorded(&driver, &sqlite_memory());

    let updated = connection
        .update(
            &Query::table("users").where_eq("active", false),
            &record([("active", true)]),
        )
        .unwrap();
    let deleted = connection
        .delete(&Query::table("users").where_null("email"))
        .unwrap();

    assert_eq!(updated, 4);
    assert_eq!(deleted, 4);
    assert_eq!(
        driver.sql_log(),
        vec![
            "update \"users\" set \"active\" = ? where \"active\" = ?",
            "delete from \"users\" where \"email\" is null",
        ]
    );
}

#[test]
fn insert_get_id_uses_driver_key() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    let id = connection
        .insert_get_id(&Query::table("users"), &record([("name", "ada")]), None)
        .unwrap();

    assert_eq!(id, Some(1));
    assert_eq!(driver.sql_log(), vec!["insert into \"users\" (\"name\") values (?)"]);
}

#[test]
fn insert_get_id_reads_returning_row_on_postgres() {
    let driver = RecordingDriver::new();
    driver.push_response(vec![Row::new().with("id", 42)]);
    let mut connection = recorded(&driver, &postgres_config());

    let id = connection
        .insert_get_id(&Query::table("users"), &record([("name", "ada")]), None)
        .unwrap();

    assert_eq!(id, Some(42));
    assert_eq!(
        driver.sql_log(),
        vec!["insert into \"users\" (\"name\") values (?) returning \"id\""]
    );
}

#[test]
fn truncate_resets_sequence_when_counter_table_exists() {
    let driver = RecordingDriver::new();
    driver.push_response(vec![Row::new().with("exists", 1)]);
    let mut connection = recorded(&driver, &sqlite_memory());

    connection.truncate(&Query::table("users")).unwrap();

    let log = driver.statements();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].sql, "delete from \"users\"");
    assert!(log[1].sql.starts_with("select exists(select 1 from sqlite_master"));
    assert_eq!(
        log[2],
        RecordedStatement {
            sql: String::from("delete from sqlite_sequence where name = ?"),
            bindings: vec![text("users")],
        }
    );
}

#[test]
fn truncate_skips_sequence_reset_without_counter_table() {
    let driver = RecordingDriver::new();
    driver.push_response(vec![Row::new().with("exists", 0)]);
    let mut connection = recorded(&driver, &sqlite_memory());

    connection.truncate(&Query::table("users")).unwrap();

    let log = driver.sql_log();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|sql| !sql.contains("sqlite_sequence where")));
}

#[test]
fn table_prefix_reaches_the_grammar() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory().with("prefix", "app_"));

    connection.select(&Query::table("users")).unwrap();

    assert_eq!(connection.table_prefix(), "app_");
    assert_eq!(driver.sql_log(), vec!["select * from \"app_users\""]);
}

// ==================== Errors ====================

#[test]
fn binding_mismatch_never_reaches_the_driver() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    let err = connection.statement("select ?, ?", &[SqlValue::Int(1)]).unwrap_err();

    assert!(matches!(
        err,
        Error::Compilation(CompileError::BindingMismatch {
            placeholders: 2,
            bindings: 1,
            ..
        })
    ));
    assert!(driver.sql_log().is_empty());
}

#[test]
fn unprepared_sql_is_not_checked_for_placeholders() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    assert!(connection.unprepared("select ?").unwrap());
}

#[test]
fn driver_failure_carries_sql_and_bindings() {
    let driver = RecordingDriver::new();
    driver.fail_on("broken");
    let mut connection = recorded(&driver, &sqlite_memory());

    let err = connection
        .affecting_statement("update broken set a = ?", &[SqlValue::Int(1)])
        .unwrap_err();

    assert!(err.to_string().starts_with("SQLite error: "));
    match err {
        Error::Execution {
            sql,
            bindings,
            driver,
            source,
        } => {
            assert_eq!(sql, "update broken set a = ?");
            assert_eq!(bindings, vec![SqlValue::Int(1)]);
            assert_eq!(driver, Driver::Sqlite);
            assert_eq!(source.code.as_deref(), Some("HY000"));
        }
        other => panic!("Expected an execution error, got {other:?}"),
    }
}

#[test]
fn unsupported_operation_is_a_compilation_error() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    let err = connection
        .schema()
        .table("users", |table| {
            table.drop_foreign("users_team_id_foreign");
        })
        .unwrap_err();

    assert!(matches!(err, Error::Compilation(CompileError::Unsupported { .. })));
}

// ==================== Query log ====================

#[test]
fn query_log_is_off_by_default() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    connection.statement("select 1", &[]).unwrap();

    assert!(!connection.logging());
    assert!(connection.query_log().is_empty());
}

#[test]
fn logged_statements_carry_timing() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());
    connection.enable_query_log();

    connection.statement("select ?", &[SqlValue::Int(5)]).unwrap();

    let log = connection.flush_query_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].query, "select ?");
    assert_eq!(log[0].bindings, vec![SqlValue::Int(5)]);
    assert!(log[0].elapsed.is_some());
    assert!(connection.query_log().is_empty());
}

#[test]
fn order_ids_increase_across_connections() {
    let driver = RecordingDriver::new();
    let sequence: Arc<dyn SequenceGenerator> = Arc::new(LocalSequence::new());
    let mut first = recorded(&driver, &sqlite_memory()).with_sequence(Arc::clone(&sequence));
    let mut second = recorded(&driver, &sqlite_memory()).with_sequence(sequence);
    first.enable_query_log();
    second.enable_query_log();

    first.statement("select 1", &[]).unwrap();
    second.statement("select 2", &[]).unwrap();
    first.statement("select 3", &[]).unwrap();
    second.statement("select 4", &[]).unwrap();

    let mut orders: Vec<(u64, String)> = first
        .query_log()
        .iter()
        .chain(second.query_log())
        .map(|entry| (entry.order, entry.query.clone()))
        .collect();
    orders.sort();
    let queries: Vec<&str> = orders.iter().map(|(_, query)| query.as_str()).collect();
    assert_eq!(queries, vec!["select 1", "select 2", "select 3", "select 4"]);
    assert!(orders.windows(2).all(|pair| pair[0].0 < pair[1].0));
}

#[test]
fn global_order_ids_strictly_increase() {
    let driver = RecordingDriver::new();
    let mut first = recorded(&driver, &sqlite_memory());
    let mut second = recorded(&driver, &sqlite_memory());
    first.enable_query_log();
    second.enable_query_log();

    first.statement("select 1", &[]).unwrap();
    second.statement("select 2", &[]).unwrap();
    first.statement("select 3", &[]).unwrap();

    let first_log = first.query_log();
    assert!(first_log[0].order < second.query_log()[0].order);
    assert!(second.query_log()[0].order < first_log[1].order);
}

// ==================== Pretend ====================

#[test]
fn pretend_logs_without_running() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    let queries = connection
        .pretend(|connection| {
            connection.insert(&Query::table("users"), &[record([("name", "ada")])])?;
            connection.update(
                &Query::table("users").where_eq("id", 1),
                &record([("name", "grace")]),
            )?;
            connection.delete(&Query::table("users").where_eq("id", 2))?;
            Ok(())
        })
        .unwrap();

    assert_eq!(queries.len(), 3);
    assert!(queries.iter().all(|entry| entry.elapsed.is_none()));
    assert_eq!(queries[0].bindings, vec![text("ada")]);
    assert!(driver.sql_log().is_empty());
}

#[test]
fn pretend_restores_the_previous_log() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());
    connection.enable_query_log();
    connection.statement("select 1", &[]).unwrap();

    let queries = connection
        .pretend(|connection| {
            connection.statement("select 2", &[])?;
            connection.statement("select 3", &[])?;
            Ok(())
        })
        .unwrap();

    assert_eq!(queries.len(), 2);
    assert_eq!(connection.query_log().len(), 1);
    assert_eq!(connection.query_log()[0].query, "select 1");
    assert!(connection.logging());
    assert!(!connection.pretending());
    assert_eq!(driver.sql_log(), vec!["select 1"]);
}

#[test]
fn pretend_restores_state_when_the_callback_fails() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    let err = connection
        .pretend(|connection| {
            connection.statement("select ?", &[])?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, Error::Compilation(_)));
    assert!(!connection.pretending());
    assert!(!connection.logging());
    assert!(connection.query_log().is_empty());
}

#[test]
fn fresh_query_log_enables_logging_temporarily() {
    let driver = RecordingDriver::new();
    let mut connection = recorded(&driver, &sqlite_memory());

    let count = connection.with_fresh_query_log(|connection| {
        connection.statement("select 1", &[]).unwrap();
        connection.query_log().len()
    });

    assert_eq!(count, 1);
    assert!(!connection.logging());
    assert!(connection.query_log().is_empty());
}

#[test]
fn open_reports_name_and_driver() {
    let driver = RecordingDriver::new();
    let connection = DatabaseConnection::open("named", &sqlite_memory(), Arc::new(driver)).unwrap();

    assert_eq!(connection.name(), "named");
    assert_eq!(connection.driver(), Driver::Sqlite);
    assert!(connection.is_connected());
}
