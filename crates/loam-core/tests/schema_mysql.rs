//! MySQL schema compilation.

mod common;
use common::*;

use loam_core::schema::grammar::{MySqlSchemaGrammar, SchemaGrammar};
use loam_core::schema::{ColumnType, ForeignKey};
use loam_core::{Blueprint, SchemaTarget};

fn users_blueprint() -> Blueprint {
    let mut blueprint = Blueprint::new("users");
    blueprint.create();
    blueprint.id();
    blueprint.string("email", 255).unique();
    blueprint.string("name", 100).nullable().default("anon");
    blueprint.boolean("active").default(true);
    blueprint.timestamps();
    blueprint
}

#[test]
fn create_table_with_fluent_index() {
    assert_eq!(
        compile_schema(&mysql_schema(), &users_blueprint()),
        vec![
            "create table `users` (`id` bigint unsigned not null auto_increment primary key, \
             `email` varchar(255) not null, `name` varchar(100) null default 'anon', \
             `active` tinyint(1) not null default '1', `created_at` timestamp null, \
             `updated_at` timestamp null)",
            "alter table `users` add unique `users_email_unique`(`email`)",
        ]
    );
}

#[test]
fn create_table_options() {
    let mut blueprint = Blueprint::new("logs");
    blueprint.create();
    blueprint.text("line");
    blueprint.charset = Some(String::from("utf8mb4"));
    blueprint.collation = Some(String::from("utf8mb4_unicode_ci"));
    blueprint.engine = Some(String::from("InnoDB"));

    assert_eq!(
        compile_schema(&mysql_schema(), &blueprint),
        vec![
            "create table `logs` (`line` text not null) default character set utf8mb4 \
             collate 'utf8mb4_unicode_ci' engine = InnoDB"
        ]
    );
}

#[test]
fn alter_table_commands_run_in_order() {
    let mut blueprint = Blueprint::new("users");
    blueprint.string("phone", 20).nullable().after("email");
    blueprint.drop_column(["legacy"]);
    blueprint.rename_column("a", "b");

    assert_eq!(
        compile_schema(&mysql_schema(), &blueprint),
        vec![
            "alter table `users` add `phone` varchar(20) null after `email`",
            "alter table `users` drop `legacy`",
            "alter table `users` rename column `a` to `b`",
        ]
    );
}

#[test]
fn foreign_key_on_existing_table() {
    let mut blueprint = Blueprint::new("posts");
    blueprint.foreign(ForeignKey::new(["user_id"]).on("users").cascade_on_delete());

    assert_eq!(
        compile_schema(&mysql_schema(), &blueprint),
        vec![
            "alter table `posts` add constraint `posts_user_id_foreign` \
             foreign key (`user_id`) references `users` (`id`) on delete cascade"
        ]
    );
}

#[test]
fn drop_and_rename_commands() {
    let mut blueprint = Blueprint::new("posts");
    blueprint.drop_primary(None);
    blueprint.drop_index("posts_title_index");
    blueprint.drop_foreign("posts_user_id_foreign");
    blueprint.rename_index("a", "b");
    blueprint.rename("articles");

    assert_eq!(
        compile_schema(&mysql_schema(), &blueprint),
        vec![
            "alter table `posts` drop primary key",
            "alter table `posts` drop index `posts_title_index`",
            "alter table `posts` drop foreign key `posts_user_id_foreign`",
            "alter table `posts` rename index `a` to `b`",
            "rename table `posts` to `articles`",
        ]
    );
}

#[test]
fn column_types_and_modifiers() {
    let mut blueprint = Blueprint::new("t");
    blueprint.enumeration("status", ["a", "b"]);
    blueprint
        .add_column("seen", ColumnType::Timestamp(Some(6)))
        .use_current()
        .use_current_on_update();
    blueprint.decimal("price", 8, 2).unsigned();
    blueprint.integer("votes").unsigned().comment("it's");
    blueprint.uuid("token").first();

    assert_eq!(
        compile_schema(&mysql_schema(), &blueprint),
        vec![
            "alter table `t` add `status` enum('a', 'b') not null, \
             add `seen` timestamp(6) default CURRENT_TIMESTAMP(6) on update CURRENT_TIMESTAMP(6) not null, \
             add `price` decimal(8, 2) not null, \
             add `votes` int unsigned not null comment 'it''s', \
             add `token` char(36) not null first"
        ]
    );
}

#[test]
fn prefix_reaches_table_and_index_names() {
    let mut blueprint = Blueprint::with_prefix("users", "app_");
    blueprint.index(["email"]);
    assert_eq!(
        compile_schema(&MySqlSchemaGrammar::with_prefix("app_"), &blueprint),
        vec!["alter table `app_users` add index `app_users_email_index`(`email`)"]
    );
}

#[test]
fn database_statements() {
    let grammar = mysql_schema();
    assert_eq!(
        grammar
            .compile_create_database("app", Some("utf8mb4"), Some("utf8mb4_unicode_ci"))
            .unwrap(),
        "create database `app` default character set `utf8mb4` default collate `utf8mb4_unicode_ci`"
    );
    assert_eq!(
        grammar.compile_drop_database_if_exists("app").unwrap(),
        "drop database if exists `app`"
    );
}

#[test]
fn drop_all_uses_a_single_statement() {
    let tables = vec![String::from("a"), String::from("b")];
    assert_eq!(
        mysql_schema().compile_drop_all_tables(&tables),
        vec!["drop table `a`,`b`"]
    );
    assert_eq!(
        mysql_schema().compile_drop_all_views(&tables),
        vec!["drop view `a`,`b`"]
    );
}

#[test]
fn introspection_binds_database_and_prefixed_table() {
    let grammar = MySqlSchemaGrammar::with_prefix("app_");
    let target = SchemaTarget::new("shop");

    assert_compiled(
        &grammar.compile_table_exists("users", &target),
        "select * from information_schema.tables where table_schema = ? and table_name = ? \
         and table_type = 'BASE TABLE'",
        &[text("shop"), text("app_users")],
    );
    assert_compiled(
        &grammar.compile_column_listing("users", &target),
        "select column_name as `column_name` from information_schema.columns \
         where table_schema = ? and table_name = ?",
        &[text("shop"), text("app_users")],
    );
    assert_eq!(
        grammar.compile_get_all_tables(&target).sql,
        "SHOW FULL TABLES WHERE table_type = 'BASE TABLE'"
    );
}

#[test]
fn foreign_key_toggles() {
    assert_eq!(
        mysql_schema().compile_enable_foreign_key_constraints(),
        "SET FOREIGN_KEY_CHECKS=1;"
    );
    assert_eq!(
        mysql_schema().compile_disable_foreign_key_constraints(),
        "SET FOREIGN_KEY_CHECKS=0;"
    );
    assert!(!mysql_schema().supports_schema_transactions());
}
