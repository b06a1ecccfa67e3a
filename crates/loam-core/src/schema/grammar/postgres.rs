//! PostgreSQL schema grammar.

use crate::error::Result;
use crate::grammar::BaseGrammar;
use crate::schema::blueprint::{Blueprint, Command, IndexCommand};
use crate::schema::column::{ColumnDefinition, ColumnType, IndexKind};
use crate::schema::SchemaTarget;
use crate::statement::CompiledStatement;
use crate::value::SqlValue;

use super::SchemaGrammar;

/// PostgreSQL schema grammar: serial types for auto increment, comments as
/// separate statements, transactional DDL.
#[derive(Debug, Clone, Default)]
pub struct PostgresSchemaGrammar {
    table_prefix: String,
}

impl PostgresSchemaGrammar {
    /// Creates a grammar without a table prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grammar with a table prefix.
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            table_prefix: prefix.to_string(),
        }
    }

    fn comments(&self, blueprint: &Blueprint) -> Vec<String> {
        blueprint
            .columns
            .iter()
            .filter_map(|column| {
                column.comment.as_ref().map(|comment| {
                    format!(
                        "comment on column {}.{} is {}",
                        self.wrap_table(&blueprint.table),
                        self.wrap(&column.name),
                        self.quote_string(comment)
                    )
                })
            })
            .collect()
    }

    fn time_type(base: &str, precision: Option<u32>, zone: &str) -> String {
        match precision {
            Some(p) => format!("{base}({p}) {zone} time zone"),
            None => format!("{base} {zone} time zone"),
        }
    }
}

impl BaseGrammar for PostgresSchemaGrammar {
    fn dialect(&self) -> &'static str {
        "PostgreSQL"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }
}

impl SchemaGrammar for PostgresSchemaGrammar {
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let create = if blueprint.temporary {
            "create temporary"
        } else {
            "create"
        };
        let mut statements = vec![format!(
            "{create} table {} ({})",
            self.wrap_table(&blueprint.table),
            self.column_definitions(blueprint).join(", ")
        )];
        statements.extend(self.comments(blueprint));
        Ok(statements)
    }

    fn compile_add(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns: Vec<String> = self
            .column_definitions(blueprint)
            .into_iter()
            .map(|column| format!("add column {column}"))
            .collect();
        let mut statements = vec![format!(
            "alter table {} {}",
            self.wrap_table(&blueprint.table),
            columns.join(", ")
        )];
        statements.extend(self.comments(blueprint));
        Ok(statements)
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Result<Vec<String>> {
        let drops: Vec<String> = columns
            .iter()
            .map(|column| format!("drop column {}", self.wrap(column)))
            .collect();
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_table(&blueprint.table),
            drops.join(", ")
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let table = self.wrap_table(&blueprint.table);
        let columns = self.columnize_names(&index.columns);
        let sql = match index.kind {
            IndexKind::Primary => format!("alter table {table} add primary key ({columns})"),
            IndexKind::Unique => format!(
                "alter table {table} add constraint {} unique ({columns})",
                self.wrap_value(&index.name)
            ),
            IndexKind::Index => {
                let algorithm = index
                    .algorithm
                    .as_ref()
                    .map(|algorithm| format!(" using {algorithm}"))
                    .unwrap_or_default();
                format!(
                    "create index {} on {table}{algorithm} ({columns})",
                    self.wrap_value(&index.name)
                )
            }
            IndexKind::Fulltext => {
                let vectors: Vec<String> = index
                    .columns
                    .iter()
                    .map(|column| format!("to_tsvector('english', {})", self.wrap(column)))
                    .collect();
                format!(
                    "create index {} on {table} using gin (({}))",
                    self.wrap_value(&index.name),
                    vectors.join(" || ")
                )
            }
            IndexKind::Spatial => format!(
                "create index {} on {table} using gist ({columns})",
                self.wrap_value(&index.name)
            ),
        };
        Ok(vec![sql])
    }

    fn compile_drop_primary(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        self.compile_drop_unique(blueprint, name)
    }

    fn compile_drop_unique(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop constraint {}",
            self.wrap_table(&blueprint.table),
            self.wrap_value(name)
        )])
    }

    fn compile_drop_index(
        &self,
        _blueprint: &Blueprint,
        _command: &Command,
        name: &str,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("drop index {}", self.wrap_value(name))])
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        self.compile_drop_unique(blueprint, name)
    }

    fn compile_rename_index(
        &self,
        _blueprint: &Blueprint,
        from: &str,
        to: &str,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter index {} rename to {}",
            self.wrap_value(from),
            self.wrap_value(to)
        )])
    }

    fn column_type(&self, column: &ColumnDefinition) -> String {
        let serial = column.auto_increment;
        let mut sql = match &column.kind {
            ColumnType::Char(length) => format!("char({length})"),
            ColumnType::String(length) => format!("varchar({length})"),
            ColumnType::TinyText => String::from("varchar(255)"),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => {
                String::from("text")
            }
            ColumnType::BigInteger if serial => String::from("bigserial"),
            ColumnType::BigInteger => String::from("bigint"),
            ColumnType::Integer | ColumnType::MediumInteger if serial => String::from("serial"),
            ColumnType::Integer | ColumnType::MediumInteger => String::from("integer"),
            ColumnType::SmallInteger | ColumnType::TinyInteger if serial => {
                String::from("smallserial")
            }
            ColumnType::SmallInteger | ColumnType::TinyInteger => String::from("smallint"),
            ColumnType::Float { .. } => String::from("real"),
            ColumnType::Double => String::from("double precision"),
            ColumnType::Decimal { total, places } => format!("decimal({total}, {places})"),
            ColumnType::Boolean => String::from("boolean"),
            ColumnType::Enum(allowed) => format!(
                "varchar(255) check ({} in ({}))",
                self.wrap(&column.name),
                self.quote_allowed(allowed)
            ),
            ColumnType::Json => String::from("json"),
            ColumnType::Jsonb => String::from("jsonb"),
            ColumnType::Date => String::from("date"),
            ColumnType::DateTime(precision) | ColumnType::Timestamp(precision) => {
                Self::time_type("timestamp", *precision, "without")
            }
            ColumnType::DateTimeTz(precision) | ColumnType::TimestampTz(precision) => {
                Self::time_type("timestamp", *precision, "with")
            }
            ColumnType::Time(precision) => Self::time_type("time", *precision, "without"),
            ColumnType::TimeTz(precision) => Self::time_type("time", *precision, "with"),
            ColumnType::Year => String::from("integer"),
            ColumnType::Binary => String::from("bytea"),
            ColumnType::Uuid => String::from("uuid"),
            ColumnType::IpAddress => String::from("inet"),
            ColumnType::MacAddress => String::from("macaddr"),
        };
        let timestamp = matches!(
            column.kind,
            ColumnType::DateTime(_)
                | ColumnType::DateTimeTz(_)
                | ColumnType::Timestamp(_)
                | ColumnType::TimestampTz(_)
        );
        if timestamp && column.use_current {
            sql.push_str(" default CURRENT_TIMESTAMP");
        }
        sql
    }

    fn modifiers(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> String {
        let mut sql = String::new();
        if let Some(collation) = &column.collation {
            sql.push_str(&format!(" collate {}", self.wrap_value(collation)));
        }
        sql.push_str(&self.modify_nullable(column));
        sql.push_str(&self.modify_default(column));
        if let Some(expression) = &column.stored_as {
            sql.push_str(&format!(" generated always as ({expression}) stored"));
        }
        if column.auto_increment && column.kind.is_integer() {
            sql.push_str(" primary key");
        }
        sql
    }

    fn compile_create_database(
        &self,
        name: &str,
        charset: Option<&str>,
        _collation: Option<&str>,
    ) -> Result<String> {
        Ok(format!(
            "create database {} encoding {}",
            self.wrap_value(name),
            self.wrap_value(charset.unwrap_or("utf8"))
        ))
    }

    fn compile_drop_database_if_exists(&self, name: &str) -> Result<String> {
        Ok(format!("drop database if exists {}", self.wrap_value(name)))
    }

    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String> {
        let tables: Vec<String> = tables.iter().map(|t| self.wrap_value(t)).collect();
        vec![format!("drop table {} cascade", tables.join(","))]
    }

    fn compile_drop_all_views(&self, views: &[String]) -> Vec<String> {
        let views: Vec<String> = views.iter().map(|v| self.wrap_value(v)).collect();
        vec![format!("drop view {} cascade", views.join(","))]
    }

    fn compile_get_all_tables(&self, target: &SchemaTarget) -> CompiledStatement {
        let (placeholders, bindings) = schema_list(target);
        CompiledStatement::new(
            format!("select tablename from pg_catalog.pg_tables where schemaname in ({placeholders})"),
            bindings,
        )
    }

    fn compile_get_all_views(&self, target: &SchemaTarget) -> CompiledStatement {
        let (placeholders, bindings) = schema_list(target);
        CompiledStatement::new(
            format!("select viewname from pg_catalog.pg_views where schemaname in ({placeholders})"),
            bindings,
        )
    }

    fn compile_table_exists(&self, table: &str, target: &SchemaTarget) -> CompiledStatement {
        let (schema, table) = schema_and_table(table, target);
        CompiledStatement::new(
            "select * from information_schema.tables where table_catalog = ? and table_schema = ? \
             and table_name = ? and table_type = 'BASE TABLE'",
            vec![
                SqlValue::Text(target.database.clone()),
                SqlValue::Text(schema.to_string()),
                SqlValue::Text(format!("{}{table}", self.table_prefix)),
            ],
        )
    }

    fn compile_column_listing(&self, table: &str, target: &SchemaTarget) -> CompiledStatement {
        let (schema, table) = schema_and_table(table, target);
        CompiledStatement::new(
            "select column_name from information_schema.columns where table_catalog = ? \
             and table_schema = ? and table_name = ?",
            vec![
                SqlValue::Text(target.database.clone()),
                SqlValue::Text(schema.to_string()),
                SqlValue::Text(format!("{}{table}", self.table_prefix)),
            ],
        )
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        String::from("SET CONSTRAINTS ALL IMMEDIATE;")
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        String::from("SET CONSTRAINTS ALL DEFERRED;")
    }

    fn supports_schema_transactions(&self) -> bool {
        true
    }
}

/// `?, ?` placeholders and bindings for the searched schemas.
fn schema_list(target: &SchemaTarget) -> (String, Vec<SqlValue>) {
    let schemas: Vec<SqlValue> = if target.schemas.is_empty() {
        vec![SqlValue::Text(String::from("public"))]
    } else {
        target.schemas.iter().cloned().map(SqlValue::Text).collect()
    };
    let placeholders = vec!["?"; schemas.len()].join(", ");
    (placeholders, schemas)
}

/// Splits `schema.table`, falling back to the target's default schema.
fn schema_and_table<'a>(table: &'a str, target: &'a SchemaTarget) -> (&'a str, &'a str) {
    table
        .split_once('.')
        .unwrap_or((target.default_schema(), table))
}
