//! MySQL query compilation.

mod common;
use common::*;

use loam_core::query::grammar::{MySqlGrammar, QueryGrammar};
use loam_core::query::Direction;
use loam_core::{record, CompileError, Param, Query, SqlValue};

// ===================================================================
// SELECT
// ===================================================================

#[test]
fn nested_where_group_keeps_binding_order() {
    let query = Query::table("users")
        .where_("age", ">", 18)
        .where_nested(|q| q.where_("city", "=", "X").or_where("city", "=", "Y"));

    assert_compiled(
        &select(&mysql(), &query),
        "select * from `users` where `age` > ? and (`city` = ? or `city` = ?)",
        &[SqlValue::Int(18), text("X"), text("Y")],
    );
}

#[test]
fn select_components_follow_fixed_order() {
    let query = Query::table("users as u")
        .select(["u.id", "p.title"])
        .join("posts as p", "p.user_id", "=", "u.id")
        .where_("u.active", "=", true)
        .group_by(["u.id"])
        .having("u.id", ">", 1)
        .order_by_desc("u.id")
        .limit(10)
        .offset(20);

    assert_compiled(
        &select(&mysql(), &query),
        "select `u`.`id`, `p`.`title` from `users` as `u` \
         inner join `posts` as `p` on `p`.`user_id` = `u`.`id` \
         where `u`.`active` = ? group by `u`.`id` having `u`.`id` > ? \
         order by `u`.`id` desc limit 10 offset 20",
        &[SqlValue::Bool(true), SqlValue::Int(1)],
    );
}

#[test]
fn table_prefix_applies_to_tables_and_aliases() {
    let query = Query::table("users as u").select(["u.id"]);
    assert_compiled(
        &select(&MySqlGrammar::with_prefix("app_"), &query),
        "select `app_u`.`id` from `app_users` as `app_u`",
        &[],
    );
}

#[test]
fn sub_select_bindings_are_spliced_in_place() {
    let posts = Query::table("posts")
        .select(["user_id"])
        .where_("votes", ">", 10);
    let query = Query::table("users")
        .where_("active", "=", 1)
        .where_in_sub("id", posts)
        .where_("age", "<", 30);

    assert_compiled(
        &select(&mysql(), &query),
        "select * from `users` where `active` = ? \
         and `id` in (select `user_id` from `posts` where `votes` > ?) and `age` < ?",
        &[SqlValue::Int(1), SqlValue::Int(10), SqlValue::Int(30)],
    );
}

#[test]
fn raw_where_keeps_quoted_literals() {
    let query = Query::table("orders")
        .where_raw("price > IF(state = 'TX', ?, 100)", vec![SqlValue::Int(200)]);
    assert_compiled(
        &select(&mysql(), &query),
        "select * from `orders` where price > IF(state = 'TX', ?, 100)",
        &[SqlValue::Int(200)],
    );
}

#[test]
fn empty_in_lists_compile_to_constant_predicates() {
    let query = Query::table("users").where_in("id", Vec::<i64>::new());
    assert_compiled(
        &select(&mysql(), &query),
        "select * from `users` where 0 = 1",
        &[],
    );

    let query = Query::table("users").where_not_in("id", Vec::<i64>::new());
    assert_compiled(
        &select(&mysql(), &query),
        "select * from `users` where 1 = 1",
        &[],
    );
}

#[test]
fn offset_without_limit_uses_max_rows() {
    let query = Query::table("users").offset(5);
    assert_compiled(
        &select(&mysql(), &query),
        "select * from `users` limit 18446744073709551615 offset 5",
        &[],
    );
}

#[test]
fn shared_lock_syntax() {
    let query = Query::table("users").where_("id", "=", 1).shared_lock();
    assert_compiled(
        &select(&mysql(), &query),
        "select * from `users` where `id` = ? lock in share mode",
        &[SqlValue::Int(1)],
    );
}

#[test]
fn distinct_aggregate() {
    let query = Query::table("users").aggregate("count", ["id"]).distinct();
    assert_compiled(
        &select(&mysql(), &query),
        "select count(distinct `id`) as aggregate from `users`",
        &[],
    );
}

#[test]
fn exists_wraps_the_select() {
    let query = Query::table("users").where_("id", "=", 1);
    let compiled = mysql().compile_exists(&query).unwrap();
    assert_compiled(
        &compiled,
        "select exists(select * from `users` where `id` = ?) as `exists`",
        &[SqlValue::Int(1)],
    );
}

#[test]
fn unknown_operator_is_rejected() {
    let query = Query::table("users").where_("id", "~", 1);
    let err = mysql().compile_select(&query).unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidOperator {
            operator: String::from("~"),
            dialect: "MySQL",
        }
    );
}

#[test]
fn dialect_operators_are_case_insensitive() {
    let query = Query::table("users").where_("name", "SOUNDS LIKE", "jon");
    assert_compiled(
        &select(&mysql(), &query),
        "select * from `users` where `name` SOUNDS LIKE ?",
        &[text("jon")],
    );
}

#[test]
fn compiling_twice_is_byte_identical() {
    let query = Query::table("users")
        .where_("age", ">", 18)
        .where_nested(|q| q.where_("city", "=", "X").or_where_null("city"))
        .order_by("name", Direction::Asc);
    let grammar = mysql();
    assert_eq!(select(&grammar, &query), select(&grammar, &query));
}

// ===================================================================
// INSERT / UPSERT
// ===================================================================

#[test]
fn multi_row_insert() {
    let rows = [
        record([("name", Param::from("a")), ("age", Param::from(1))]),
        record([("age", Param::from(2)), ("name", Param::from("b"))]),
    ];
    let compiled = mysql()
        .compile_insert(&Query::table("users"), &rows)
        .unwrap();
    assert_compiled(
        &compiled,
        "insert into `users` (`name`, `age`) values (?, ?), (?, ?)",
        &[text("a"), SqlValue::Int(1), text("b"), SqlValue::Int(2)],
    );
}

#[test]
fn insert_rows_must_share_columns() {
    let rows = [record([("name", "a")]), record([("email", "b")])];
    let err = mysql()
        .compile_insert(&Query::table("users"), &rows)
        .unwrap_err();
    assert_eq!(err, CompileError::RecordMismatch(String::from("email")));
}

#[test]
fn empty_insert_uses_default_values() {
    let compiled = mysql().compile_insert(&Query::table("users"), &[]).unwrap();
    assert_compiled(&compiled, "insert into `users` () values ()", &[]);
}

#[test]
fn insert_without_table_fails() {
    let err = mysql()
        .compile_insert(&Query::new(), &[record([("a", 1)])])
        .unwrap_err();
    assert_eq!(err, CompileError::MissingTable("insert"));
}

#[test]
fn insert_ignore() {
    let compiled = mysql()
        .compile_insert_or_ignore(&Query::table("users"), &[record([("email", "a@x")])])
        .unwrap();
    assert_compiled(
        &compiled,
        "insert ignore into `users` (`email`) values (?)",
        &[text("a@x")],
    );
}

#[test]
fn upsert_on_duplicate_key() {
    let rows = [record([("email", "a@x"), ("name", "A")])];
    let compiled = mysql()
        .compile_upsert(&Query::table("users"), &rows, &["email"], &["name"])
        .unwrap();
    assert_compiled(
        &compiled,
        "insert into `users` (`email`, `name`) values (?, ?) \
         on duplicate key update `name` = values(`name`)",
        &[text("a@x"), text("A")],
    );
}

// ===================================================================
// UPDATE / DELETE / TRUNCATE
// ===================================================================

#[test]
fn update_appends_order_and_limit() {
    let query = Query::table("users")
        .where_("id", ">", 5)
        .order_by("id", Direction::Asc)
        .limit(1);
    let compiled = mysql()
        .compile_update(&query, &record([("name", "x")]))
        .unwrap();
    assert_compiled(
        &compiled,
        "update `users` set `name` = ? where `id` > ? order by `id` asc limit 1",
        &[text("x"), SqlValue::Int(5)],
    );
}

#[test]
fn update_with_join() {
    let query = Query::table("users")
        .join("posts", "posts.user_id", "=", "users.id")
        .where_("posts.id", "=", 3);
    let compiled = mysql()
        .compile_update(&query, &record([("votes", 1)]))
        .unwrap();
    assert_compiled(
        &compiled,
        "update `users` inner join `posts` on `posts`.`user_id` = `users`.`id` \
         set `votes` = ? where `posts`.`id` = ?",
        &[SqlValue::Int(1), SqlValue::Int(3)],
    );
}

#[test]
fn update_without_values_fails() {
    let err = mysql()
        .compile_update(&Query::table("users"), &Vec::new())
        .unwrap_err();
    assert_eq!(err, CompileError::EmptyValues("update"));
}

#[test]
fn delete_with_join_targets_alias() {
    let query = Query::table("users as u")
        .join("posts as p", "p.user_id", "=", "u.id")
        .where_("p.id", "=", 3);
    let compiled = mysql().compile_delete(&query).unwrap();
    assert_compiled(
        &compiled,
        "delete `u` from `users` as `u` inner join `posts` as `p` on `p`.`user_id` = `u`.`id` \
         where `p`.`id` = ?",
        &[SqlValue::Int(3)],
    );
}

#[test]
fn truncate_table() {
    let statements = mysql().compile_truncate(&Query::table("users")).unwrap();
    assert_eq!(statements.len(), 1);
    assert_compiled(&statements[0], "truncate table `users`", &[]);
}

#[test]
fn transaction_statements() {
    let grammar = mysql();
    assert_eq!(grammar.compile_begin_transaction(), "start transaction");
    assert_eq!(grammar.compile_commit(), "commit");
    assert_eq!(grammar.compile_savepoint("trans2"), "savepoint `trans2`");
    assert_eq!(
        grammar.compile_rollback_to_savepoint("trans2"),
        "rollback to savepoint `trans2`"
    );
}
