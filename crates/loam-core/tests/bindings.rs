//! Placeholder counting and binding validation.

use loam_core::statement::count_placeholders;
use loam_core::{CompiledStatement, Driver, Query, SqlValue};

#[test]
fn quoted_question_marks_are_not_placeholders() {
    assert_eq!(count_placeholders("select '?' from t where a = ?"), 1);
    assert_eq!(count_placeholders("select \"?\" from t"), 0);
    assert_eq!(count_placeholders("select `a?` from t where b = ?"), 1);
    assert_eq!(count_placeholders("select 'it''s ?' where c = ?"), 1);
}

#[test]
fn every_dialect_compiles_aligned_statements() {
    let query = Query::table("users")
        .where_("age", ">", 18)
        .where_in("role", ["admin", "staff"])
        .where_between("score", 1, 10)
        .order_by_raw("field(id, ?)", vec![SqlValue::Int(3)])
        .limit(5);

    for driver in [Driver::MySql, Driver::Postgres, Driver::Sqlite] {
        let compiled: CompiledStatement = driver.query_grammar("").compile_select(&query).unwrap();
        assert_eq!(compiled.placeholder_count(), compiled.bindings.len(), "{driver}");
        assert_eq!(compiled.bindings.len(), 6, "{driver}");
    }
}
