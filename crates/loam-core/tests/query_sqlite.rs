//! SQLite query compilation.

mod common;
use common::*;

use loam_core::query::grammar::{QueryGrammar, SqliteGrammar};
use loam_core::{record, CompileError, Query, SqlValue};

#[test]
fn offset_without_limit() {
    let query = Query::table("users").offset(10);
    assert_compiled(
        &select(&sqlite(), &query),
        "select * from \"users\" limit -1 offset 10",
        &[],
    );
}

#[test]
fn row_locks_are_ignored() {
    let query = Query::table("users").where_("id", "=", 1).lock_for_update();
    assert_compiled(
        &select(&sqlite(), &query),
        "select * from \"users\" where \"id\" = ?",
        &[SqlValue::Int(1)],
    );
}

#[test]
fn between_and_null_checks() {
    let query = Query::table("users")
        .where_between("age", 18, 30)
        .or_where_null("age")
        .where_not_null("email");
    assert_compiled(
        &select(&sqlite(), &query),
        "select * from \"users\" where \"age\" between ? and ? or \"age\" is null \
         and \"email\" is not null",
        &[SqlValue::Int(18), SqlValue::Int(30)],
    );
}

#[test]
fn glob_operator() {
    let query = Query::table("files").where_("path", "glob", "*.rs");
    assert_compiled(
        &select(&sqlite(), &query),
        "select * from \"files\" where \"path\" glob ?",
        &[text("*.rs")],
    );
}

#[test]
fn column_comparison_has_no_binding() {
    let query = Query::table("users").where_column("updated_at", ">", "created_at");
    assert_compiled(
        &select(&sqlite(), &query),
        "select * from \"users\" where \"updated_at\" > \"created_at\"",
        &[],
    );
}

#[test]
fn insert_or_ignore() {
    let compiled = sqlite()
        .compile_insert_or_ignore(&Query::table("users"), &[record([("email", "a@x")])])
        .unwrap();
    assert_compiled(
        &compiled,
        "insert or ignore into \"users\" (\"email\") values (?)",
        &[text("a@x")],
    );
}

#[test]
fn empty_insert_uses_default_values() {
    let compiled = sqlite().compile_insert(&Query::table("users"), &[]).unwrap();
    assert_compiled(&compiled, "insert into \"users\" default values", &[]);
}

#[test]
fn upsert_updates_from_excluded() {
    let rows = [record([("email", "a@x"), ("name", "A")])];
    let compiled = sqlite()
        .compile_upsert(&Query::table("users"), &rows, &["email"], &["name"])
        .unwrap();
    assert_compiled(
        &compiled,
        "insert into \"users\" (\"email\", \"name\") values (?, ?) \
         on conflict (\"email\") do update set \"name\" = \"excluded\".\"name\"",
        &[text("a@x"), text("A")],
    );
}

#[test]
fn upsert_without_update_columns_ignores() {
    let rows = [record([("email", "a@x")])];
    let compiled = sqlite()
        .compile_upsert(&Query::table("users"), &rows, &["email"], &[])
        .unwrap();
    assert!(compiled.sql.starts_with("insert or ignore into"));
}

#[test]
fn limited_update_goes_through_rowid() {
    let query = Query::table("users").where_("id", ">", 5).limit(1);
    let compiled = sqlite()
        .compile_update(&query, &record([("name", "x")]))
        .unwrap();
    assert_compiled(
        &compiled,
        "update \"users\" set \"name\" = ? where \"rowid\" in \
         (select \"users\".\"rowid\" from \"users\" where \"id\" > ? limit 1)",
        &[text("x"), SqlValue::Int(5)],
    );
}

#[test]
fn limited_delete_goes_through_rowid() {
    let query = Query::table("users").where_("id", ">", 5).limit(2);
    let compiled = sqlite().compile_delete(&query).unwrap();
    assert_compiled(
        &compiled,
        "delete from \"users\" where \"rowid\" in \
         (select \"users\".\"rowid\" from \"users\" where \"id\" > ? limit 2)",
        &[SqlValue::Int(5)],
    );
}

#[test]
fn truncate_deletes_every_row() {
    let statements = SqliteGrammar::with_prefix("app_")
        .compile_truncate(&Query::table("users"))
        .unwrap();
    assert_eq!(statements.len(), 1);
    assert_compiled(&statements[0], "delete from \"app_users\"", &[]);
}

#[test]
fn sequence_reset_uses_prefixed_name() {
    let reset = SqliteGrammar::with_prefix("app_")
        .compile_sequence_reset(&Query::table("users"))
        .unwrap();
    assert_compiled(
        &reset.exists,
        "select exists(select 1 from sqlite_master \
         where type = 'table' and name = 'sqlite_sequence')",
        &[],
    );
    assert_compiled(
        &reset.reset,
        "delete from sqlite_sequence where name = ?",
        &[text("app_users")],
    );
}

#[test]
fn sequence_reset_ignores_table_alias() {
    let reset = sqlite()
        .compile_sequence_reset(&Query::table("users as u"))
        .unwrap();
    assert_eq!(reset.reset.bindings, vec![text("users")]);
}

#[test]
fn upsert_without_unique_columns_fails() {
    let rows = [record([("email", "a@x")])];
    let result = sqlite().compile_upsert(&Query::table("users"), &rows, &[], &["email"]);
    assert!(matches!(result, Err(CompileError::Unsupported { .. })));
}
