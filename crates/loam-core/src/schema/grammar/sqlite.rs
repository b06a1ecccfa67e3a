//! SQLite schema grammar.
//!
//! SQLite cannot alter constraints on an existing table: primary and
//! foreign keys are only emitted inside `create table`, and the other
//! constraint changes fail with [`CompileError::Unsupported`](crate::CompileError::Unsupported).

use crate::error::Result;
use crate::grammar::BaseGrammar;
use crate::schema::blueprint::{Blueprint, Command, ForeignKey, IndexCommand};
use crate::schema::column::{ColumnDefinition, ColumnType, IndexKind};
use crate::schema::SchemaTarget;
use crate::statement::CompiledStatement;
use crate::value::SqlValue;

use super::SchemaGrammar;

/// SQLite schema grammar.
#[derive(Debug, Clone, Default)]
pub struct SqliteSchemaGrammar {
    table_prefix: String,
}

impl SqliteSchemaGrammar {
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

    fn inline_foreign_keys(&self, blueprint: &Blueprint) -> String {
        blueprint
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::Foreign(foreign) => {
                    let mut sql = format!(
                        ", foreign key({}) references {}({})",
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
                    Some(sql)
                }
                _ => None,
            })
            .collect()
    }

    /// Primary keys declared on the table or on a column; SQLite can only
    /// add them inside `create table`.
    fn inline_primary_key(&self, blueprint: &Blueprint) -> String {
        blueprint
            .to_commands()
            .iter()
            .find_map(|command| match command {
                Command::Index(index) if index.kind == IndexKind::Primary => Some(format!(
                    ", primary key ({})",
                    self.columnize_names(&index.columns)
                )),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn drop_named_index(&self, name: &str) -> Vec<String> {
        vec![format!("drop index {}", self.wrap_value(name))]
    }
}

impl BaseGrammar for SqliteSchemaGrammar {
    fn dialect(&self) -> &'static str {
        "SQLite"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }
}

impl SchemaGrammar for SqliteSchemaGrammar {
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let create = if blueprint.temporary {
            "create temporary"
        } else {
            "create"
        };
        Ok(vec![format!(
            "{create} table {} ({}{}{})",
            self.wrap_table(&blueprint.table),
            self.column_definitions(blueprint).join(", "),
            self.inline_foreign_keys(blueprint),
            self.inline_primary_key(blueprint)
        )])
    }

    fn compile_add(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let table = self.wrap_table(&blueprint.table);
        Ok(self
            .column_definitions(blueprint)
            .into_iter()
            .map(|column| format!("alter table {table} add column {column}"))
            .collect())
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Result<Vec<String>> {
        let table = self.wrap_table(&blueprint.table);
        Ok(columns
            .iter()
            .map(|column| format!("alter table {table} drop column {}", self.wrap(column)))
            .collect())
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let keyword = match index.kind {
            IndexKind::Primary if blueprint.creating() => return Ok(Vec::new()),
            IndexKind::Primary => return Err(self.unsupported("adding a primary key")),
            IndexKind::Fulltext => return Err(self.unsupported("fulltext indexes")),
            IndexKind::Spatial => return Err(self.unsupported("spatial indexes")),
            IndexKind::Unique => "create unique index",
            IndexKind::Index => "create index",
        };
        Ok(vec![format!(
            "{keyword} {} on {} ({})",
            self.wrap_value(&index.name),
            self.wrap_table(&blueprint.table),
            self.columnize_names(&index.columns)
        )])
    }

    fn compile_foreign(
        &self,
        blueprint: &Blueprint,
        _foreign: &ForeignKey,
    ) -> Result<Vec<String>> {
        if blueprint.creating() {
            Ok(Vec::new())
        } else {
            Err(self.unsupported("adding a foreign key to an existing table"))
        }
    }

    fn compile_drop_primary(&self, _blueprint: &Blueprint, _name: &str) -> Result<Vec<String>> {
        Err(self.unsupported("dropping a primary key"))
    }

    fn compile_drop_unique(&self, _blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        Ok(self.drop_named_index(name))
    }

    fn compile_drop_index(
        &self,
        _blueprint: &Blueprint,
        command: &Command,
        name: &str,
    ) -> Result<Vec<String>> {
        match command {
            Command::DropFulltext(_) => Err(self.unsupported("fulltext indexes")),
            Command::DropSpatialIndex(_) => Err(self.unsupported("spatial indexes")),
            _ => Ok(self.drop_named_index(name)),
        }
    }

    fn compile_drop_foreign(&self, _blueprint: &Blueprint, _name: &str) -> Result<Vec<String>> {
        Err(self.unsupported("dropping a foreign key"))
    }

    fn compile_rename_index(
        &self,
        _blueprint: &Blueprint,
        _from: &str,
        _to: &str,
    ) -> Result<Vec<String>> {
        Err(self.unsupported("renaming an index"))
    }

    fn column_type(&self, column: &ColumnDefinition) -> String {
        match &column.kind {
            ColumnType::Char(_)
            | ColumnType::String(_)
            | ColumnType::Uuid
            | ColumnType::IpAddress
            | ColumnType::MacAddress => String::from("varchar"),
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Json
            | ColumnType::Jsonb => String::from("text"),
            ColumnType::BigInteger
            | ColumnType::Integer
            | ColumnType::MediumInteger
            | ColumnType::SmallInteger
            | ColumnType::TinyInteger
            | ColumnType::Year => String::from("integer"),
            ColumnType::Float { .. } | ColumnType::Double => String::from("float"),
            ColumnType::Decimal { .. } => String::from("numeric"),
            ColumnType::Boolean => String::from("tinyint(1)"),
            ColumnType::Enum(allowed) => format!(
                "varchar check ({} in ({}))",
                self.wrap(&column.name),
                self.quote_allowed(allowed)
            ),
            ColumnType::Date => String::from("date"),
            ColumnType::DateTime(_)
            | ColumnType::DateTimeTz(_)
            | ColumnType::Timestamp(_)
            | ColumnType::TimestampTz(_) => {
                if column.use_current {
                    String::from("datetime default CURRENT_TIMESTAMP")
                } else {
                    String::from("datetime")
                }
            }
            ColumnType::Time(_) | ColumnType::TimeTz(_) => String::from("time"),
            ColumnType::Binary => String::from("blob"),
        }
    }

    fn modifiers(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> String {
        let mut sql = String::new();
        if let Some(expression) = &column.virtual_as {
            sql.push_str(&format!(" as ({expression})"));
        }
        if let Some(expression) = &column.stored_as {
            sql.push_str(&format!(" as ({expression}) stored"));
        }
        sql.push_str(&self.modify_nullable(column));
        sql.push_str(&self.modify_default(column));
        if column.auto_increment && column.kind.is_integer() {
            sql.push_str(" primary key autoincrement");
        }
        sql
    }

    fn compile_create_database(
        &self,
        _name: &str,
        _charset: Option<&str>,
        _collation: Option<&str>,
    ) -> Result<String> {
        Err(self.unsupported("creating a database"))
    }

    fn compile_drop_database_if_exists(&self, _name: &str) -> Result<String> {
        Err(self.unsupported("dropping a database"))
    }

    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String> {
        tables
            .iter()
            .map(|table| format!("drop table {}", self.wrap_value(table)))
            .collect()
    }

    fn compile_drop_all_views(&self, views: &[String]) -> Vec<String> {
        views
            .iter()
            .map(|view| format!("drop view {}", self.wrap_value(view)))
            .collect()
    }

    fn compile_get_all_tables(&self, _target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::raw(
            "select name from sqlite_master where type = 'table' and name not like 'sqlite_%'",
        )
    }

    fn compile_get_all_views(&self, _target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::raw("select name from sqlite_master where type = 'view'")
    }

    fn compile_table_exists(&self, table: &str, _target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::new(
            "select * from sqlite_master where type = 'table' and name = ?",
            vec![SqlValue::Text(format!("{}{table}", self.table_prefix))],
        )
    }

    fn compile_column_listing(&self, table: &str, _target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::raw(format!("pragma table_info({})", self.wrap_table(table)))
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        String::from("PRAGMA foreign_keys = ON;")
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        String::from("PRAGMA foreign_keys = OFF;")
    }
}
