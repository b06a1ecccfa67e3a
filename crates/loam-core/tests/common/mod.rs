#![allow(dead_code)]

use loam_core::query::grammar::{MySqlGrammar, PostgresGrammar, QueryGrammar, SqliteGrammar};
use loam_core::schema::grammar::{
    MySqlSchemaGrammar, PostgresSchemaGrammar, SchemaGrammar, SqliteSchemaGrammar,
};
use loam_core::{Blueprint, CompiledStatement, SqlValue};

pub fn mysql() -> MySqlGrammar {
    MySqlGrammar::new()
}

pub fn postgres() -> PostgresGrammar {
    PostgresGrammar::new()
}

pub fn sqlite() -> SqliteGrammar {
    SqliteGrammar::new()
}

pub fn mysql_schema() -> MySqlSchemaGrammar {
    MySqlSchemaGrammar::new()
}

pub fn postgres_schema() -> PostgresSchemaGrammar {
    PostgresSchemaGrammar::new()
}

pub fn sqlite_schema() -> SqliteSchemaGrammar {
    SqliteSchemaGrammar::new()
}

/// Asserts the SQL text and bindings of a compiled statement, and that the
/// two line up.
pub fn assert_compiled(compiled: &CompiledStatement, sql: &str, bindings: &[SqlValue]) {
    assert_eq!(compiled.sql, sql);
    assert_eq!(compiled.bindings, bindings);
    compiled
        .validate()
        .unwrap_or_else(|e| panic!("Placeholder mismatch: {e}"));
}

/// Compiles a blueprint, panicking on error.
pub fn compile_schema(grammar: &dyn SchemaGrammar, blueprint: &Blueprint) -> Vec<String> {
    grammar
        .compile(blueprint)
        .unwrap_or_else(|e| panic!("Failed to compile {}: {e}", blueprint.table))
}

/// Compiles a select, panicking on error.
pub fn select(grammar: &dyn QueryGrammar, query: &loam_core::Query) -> CompiledStatement {
    grammar
        .compile_select(query)
        .unwrap_or_else(|e| panic!("Failed to compile select: {e}"))
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}
