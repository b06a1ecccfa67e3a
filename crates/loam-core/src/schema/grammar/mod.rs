//! Schema grammars: compile blueprints and introspection requests into
//! dialect DDL.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlSchemaGrammar;
pub use postgres::PostgresSchemaGrammar;
pub use sqlite::SqliteSchemaGrammar;

use crate::error::{CompileError, Result};
use crate::grammar::BaseGrammar;
use crate::statement::CompiledStatement;
use crate::value::{Param, SqlValue};

use super::blueprint::{Blueprint, Command, ForeignKey, IndexCommand};
use super::column::ColumnDefinition;
use super::SchemaTarget;

/// Compiles schema blueprints and introspection queries for one dialect.
pub trait SchemaGrammar: BaseGrammar + Send + Sync {
    /// Compiles every command of the blueprint, in order.
    fn compile(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for command in blueprint.to_commands() {
            statements.extend(self.compile_command(blueprint, &command)?);
        }
        Ok(statements)
    }

    /// Compiles one command.
    fn compile_command(&self, blueprint: &Blueprint, command: &Command) -> Result<Vec<String>> {
        match command {
            Command::Create => self.compile_create(blueprint),
            Command::Add => self.compile_add(blueprint),
            Command::Drop => Ok(vec![format!(
                "drop table {}",
                self.wrap_table(&blueprint.table)
            )]),
            Command::DropIfExists => Ok(vec![format!(
                "drop table if exists {}",
                self.wrap_table(&blueprint.table)
            )]),
            Command::Rename(to) => Ok(vec![self.compile_rename(blueprint, to)]),
            Command::DropColumn(columns) => self.compile_drop_column(blueprint, columns),
            Command::RenameColumn { from, to } => Ok(vec![format!(
                "alter table {} rename column {} to {}",
                self.wrap_table(&blueprint.table),
                self.wrap(from),
                self.wrap(to)
            )]),
            Command::Index(index) => self.compile_index(blueprint, index),
            Command::Foreign(foreign) => self.compile_foreign(blueprint, foreign),
            Command::DropPrimary(name) => self.compile_drop_primary(blueprint, name),
            Command::DropUnique(name) => self.compile_drop_unique(blueprint, name),
            Command::DropIndex(name)
            | Command::DropFulltext(name)
            | Command::DropSpatialIndex(name) => self.compile_drop_index(blueprint, command, name),
            Command::DropForeign(name) => self.compile_drop_foreign(blueprint, name),
            Command::RenameIndex { from, to } => self.compile_rename_index(blueprint, from, to),
        }
    }

    /// `create table …`
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>>;

    /// Adds the blueprint's columns to an existing table.
    fn compile_add(&self, blueprint: &Blueprint) -> Result<Vec<String>>;

    /// Renames the table.
    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> String {
        format!(
            "alter table {} rename to {}",
            self.wrap_table(&blueprint.table),
            self.wrap_table(to)
        )
    }

    /// Drops columns.
    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Result<Vec<String>>;

    /// Creates an index.
    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>>;

    /// Adds a foreign key constraint.
    fn compile_foreign(&self, blueprint: &Blueprint, foreign: &ForeignKey) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add constraint {} {}",
            self.wrap_table(&blueprint.table),
            self.wrap_value(&blueprint.foreign_key_name(foreign)),
            self.foreign_key_clause(foreign)
        )])
    }

    /// `foreign key (…) references t (…) [on delete …] [on update …]`
    fn foreign_key_clause(&self, foreign: &ForeignKey) -> String {
        let mut sql = format!(
            "foreign key ({}) references {} ({})",
            self.columnize_names(&foreign.columns),
            self.wrap_table(&foreign.on),
            self.columnize_names(&foreign.references)
        );
        if let Some(action) = &foreign.on_delete {
            sql.push_str(&format!(" on delete {action}"));
        }
        if let Some(action) = &foreign.on_update {
            sql.push_str(&format!(" on update {action}"));
        }
        sql
    }

    /// Drops the primary key.
    fn compile_drop_primary(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>>;

    /// Drops a unique index.
    fn compile_drop_unique(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>>;

    /// Drops a plain, full text or spatial index.
    fn compile_drop_index(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        name: &str,
    ) -> Result<Vec<String>>;

    /// Drops a foreign key.
    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>>;

    /// Renames an index.
    fn compile_rename_index(&self, blueprint: &Blueprint, from: &str, to: &str)
        -> Result<Vec<String>>;

    /// `name type modifiers` for every column, in declaration order.
    fn column_definitions(&self, blueprint: &Blueprint) -> Vec<String> {
        blueprint
            .columns
            .iter()
            .map(|column| {
                format!(
                    "{} {}{}",
                    self.wrap(&column.name),
                    self.column_type(column),
                    self.modifiers(blueprint, column)
                )
            })
            .collect()
    }

    /// Concrete type of a column.
    fn column_type(&self, column: &ColumnDefinition) -> String;

    /// Modifiers following the type.
    fn modifiers(&self, blueprint: &Blueprint, column: &ColumnDefinition) -> String;

    /// ` null` / ` not null`; generated columns only state `not null`.
    fn modify_nullable(&self, column: &ColumnDefinition) -> String {
        let generated = column.virtual_as.is_some() || column.stored_as.is_some();
        match (generated, column.nullable) {
            (false, true) => String::from(" null"),
            (_, false) => String::from(" not null"),
            (true, true) => String::new(),
        }
    }

    /// ` default …`
    fn modify_default(&self, column: &ColumnDefinition) -> String {
        column
            .default
            .as_ref()
            .map(|value| format!(" default {}", self.default_value(value)))
            .unwrap_or_default()
    }

    /// Inline representation of a default value.
    fn default_value(&self, value: &Param) -> String {
        match value {
            Param::Raw(expression) => expression.to_string(),
            Param::Value(SqlValue::Bool(b)) => String::from(if *b { "'1'" } else { "'0'" }),
            Param::Value(value) => value.to_sql_inline(),
        }
    }

    /// `'a', 'b'` for enum definitions.
    fn quote_allowed(&self, allowed: &[String]) -> String {
        allowed
            .iter()
            .map(|value| self.quote_string(value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Creates a database.
    fn compile_create_database(
        &self,
        name: &str,
        charset: Option<&str>,
        collation: Option<&str>,
    ) -> Result<String>;

    /// Drops a database if it exists.
    fn compile_drop_database_if_exists(&self, name: &str) -> Result<String>;

    /// Drops the named tables (already prefixed).
    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String>;

    /// Drops the named views.
    fn compile_drop_all_views(&self, views: &[String]) -> Vec<String>;

    /// Lists tables; the table name is the first column of each row.
    fn compile_get_all_tables(&self, target: &SchemaTarget) -> CompiledStatement;

    /// Lists views; the view name is the first column of each row.
    fn compile_get_all_views(&self, target: &SchemaTarget) -> CompiledStatement;

    /// Returns a row when `table` exists.
    fn compile_table_exists(&self, table: &str, target: &SchemaTarget) -> CompiledStatement;

    /// Lists the columns of `table`.
    fn compile_column_listing(&self, table: &str, target: &SchemaTarget) -> CompiledStatement;

    /// Turns foreign key enforcement on.
    fn compile_enable_foreign_key_constraints(&self) -> String;

    /// Turns foreign key enforcement off.
    fn compile_disable_foreign_key_constraints(&self) -> String;

    /// Whether DDL can run inside a transaction.
    fn supports_schema_transactions(&self) -> bool {
        false
    }

    /// Error for operations the dialect cannot express.
    fn unsupported(&self, feature: &str) -> CompileError {
        CompileError::Unsupported {
            dialect: self.dialect(),
            feature: feature.to_string(),
        }
    }
}
