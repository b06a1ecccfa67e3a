//! MySQL schema grammar.

use crate::error::Result;
use crate::grammar::BaseGrammar;
use crate::schema::blueprint::{Blueprint, Command, IndexCommand};
use crate::schema::column::{ColumnDefinition, ColumnType, IndexKind};
use crate::schema::SchemaTarget;
use crate::statement::CompiledStatement;
use crate::value::SqlValue;

use super::SchemaGrammar;

/// MySQL schema grammar.
#[derive(Debug, Clone, Default)]
pub struct MySqlSchemaGrammar {
    table_prefix: String,
}

impl MySqlSchemaGrammar {
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

    fn timestamp_type(base: &str, precision: Option<u32>, column: &ColumnDefinition) -> String {
        let (mut sql, current) = match precision {
            Some(p) => (format!("{base}({p})"), format!("CURRENT_TIMESTAMP({p})")),
            None => (base.to_string(), String::from("CURRENT_TIMESTAMP")),
        };
        if column.use_current {
            sql = format!("{sql} default {current}");
        }
        if column.use_current_on_update {
            sql = format!("{sql} on update {current}");
        }
        sql
    }

    fn with_precision(base: &str, precision: Option<u32>) -> String {
        precision.map_or_else(|| base.to_string(), |p| format!("{base}({p})"))
    }
}

impl BaseGrammar for MySqlSchemaGrammar {
    fn dialect(&self) -> &'static str {
        "MySQL"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        format!("`{}`", value.replace('`', "``"))
    }
}

impl SchemaGrammar for MySqlSchemaGrammar {
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let create = if blueprint.temporary {
            "create temporary"
        } else {
            "create"
        };
        let mut sql = format!(
            "{create} table {} ({})",
            self.wrap_table(&blueprint.table),
            self.column_definitions(blueprint).join(", ")
        );
        if let Some(charset) = &blueprint.charset {
            sql.push_str(&format!(" default character set {charset}"));
        }
        if let Some(collation) = &blueprint.collation {
            sql.push_str(&format!(" collate '{collation}'"));
        }
        if let Some(engine) = &blueprint.engine {
            sql.push_str(&format!(" engine = {engine}"));
        }
        Ok(vec![sql])
    }

    fn compile_add(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns: Vec<String> = self
            .column_definitions(blueprint)
            .into_iter()
            .map(|column| format!("add {column}"))
            .collect();
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_table(&blueprint.table),
            columns.join(", ")
        )])
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> String {
        format!(
            "rename table {} to {}",
            self.wrap_table(&blueprint.table),
            self.wrap_table(to)
        )
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Result<Vec<String>> {
        let drops: Vec<String> = columns
            .iter()
            .map(|column| format!("drop {}", self.wrap(column)))
            .collect();
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_table(&blueprint.table),
            drops.join(", ")
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let name = match index.kind {
            IndexKind::Primary => String::new(),
            _ => self.wrap_value(&index.name),
        };
        let keyword = match index.kind {
            IndexKind::Primary => "primary key ",
            IndexKind::Unique => "unique ",
            IndexKind::Index => "index ",
            IndexKind::Fulltext => "fulltext ",
            IndexKind::Spatial => "spatial index ",
        };
        let algorithm = index
            .algorithm
            .as_ref()
            .map(|algorithm| format!(" using {algorithm}"))
            .unwrap_or_default();
        Ok(vec![format!(
            "alter table {} add {keyword}{name}{algorithm}({})",
            self.wrap_table(&blueprint.table),
            self.columnize_names(&index.columns)
        )])
    }

    fn compile_drop_primary(&self, blueprint: &Blueprint, _name: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop primary key",
            self.wrap_table(&blueprint.table)
        )])
    }

    fn compile_drop_unique(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop index {}",
            self.wrap_table(&blueprint.table),
            self.wrap_value(name)
        )])
    }

    fn compile_drop_index(
        &self,
        blueprint: &Blueprint,
        _command: &Command,
        name: &str,
    ) -> Result<Vec<String>> {
        self.compile_drop_unique(blueprint, name)
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop foreign key {}",
            self.wrap_table(&blueprint.table),
            self.wrap_value(name)
        )])
    }

    fn compile_rename_index(
        &self,
        blueprint: &Blueprint,
        from: &str,
        to: &str,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename index {} to {}",
            self.wrap_table(&blueprint.table),
            self.wrap_value(from),
            self.wrap_value(to)
        )])
    }

    fn column_type(&self, column: &ColumnDefinition) -> String {
        match &column.kind {
            ColumnType::Char(length) => format!("char({length})"),
            ColumnType::String(length) => format!("varchar({length})"),
            ColumnType::TinyText => String::from("tinytext"),
            ColumnType::Text => String::from("text"),
            ColumnType::MediumText => String::from("mediumtext"),
            ColumnType::LongText => String::from("longtext"),
            ColumnType::BigInteger => String::from("bigint"),
            ColumnType::Integer => String::from("int"),
            ColumnType::MediumInteger => String::from("mediumint"),
            ColumnType::SmallInteger => String::from("smallint"),
            ColumnType::TinyInteger => String::from("tinyint"),
            ColumnType::Float {
                total: Some(total),
                places: Some(places),
            } => format!("float({total}, {places})"),
            ColumnType::Float { .. } => String::from("float"),
            ColumnType::Double => String::from("double"),
            ColumnType::Decimal { total, places } => format!("decimal({total}, {places})"),
            ColumnType::Boolean => String::from("tinyint(1)"),
            ColumnType::Enum(allowed) => format!("enum({})", self.quote_allowed(allowed)),
            ColumnType::Json | ColumnType::Jsonb => String::from("json"),
            ColumnType::Date => String::from("date"),
            ColumnType::DateTime(precision) | ColumnType::DateTimeTz(precision) => {
                Self::timestamp_type("datetime", *precision, column)
            }
            ColumnType::Time(precision) | ColumnType::TimeTz(precision) => {
                Self::with_precision("time", *precision)
            }
            ColumnType::Timestamp(precision) | ColumnType::TimestampTz(precision) => {
                Self::timestamp_type("timestamp", *precision, column)
            }
            ColumnType::Year => String::from("year"),
            ColumnType::Binary => String::from("blob"),
            ColumnType::Uuid => String::from("char(36)"),
            ColumnType::IpAddress => String::from("varchar(45)"),
            ColumnType::MacAddress => String::from("varchar(17)"),
        }
    }

    fn modifiers(&self, _blueprint: &Blueprint, column: &ColumnDefinition) -> String {
        let mut sql = String::new();
        if column.unsigned && column.kind.is_integer() {
            sql.push_str(" unsigned");
        }
        if let Some(charset) = &column.charset {
            sql.push_str(&format!(" character set {charset}"));
        }
        if let Some(collation) = &column.collation {
            sql.push_str(&format!(" collate '{collation}'"));
        }
        if let Some(expression) = &column.virtual_as {
            sql.push_str(&format!(" as ({expression})"));
        }
        if let Some(expression) = &column.stored_as {
            sql.push_str(&format!(" as ({expression}) stored"));
        }
        sql.push_str(&self.modify_nullable(column));
        sql.push_str(&self.modify_default(column));
        if column.auto_increment && column.kind.is_integer() {
            sql.push_str(" auto_increment primary key");
        }
        if let Some(comment) = &column.comment {
            sql.push_str(&format!(" comment {}", self.quote_string(comment)));
        }
        if let Some(after) = &column.after {
            sql.push_str(&format!(" after {}", self.wrap(after)));
        }
        if column.first {
            sql.push_str(" first");
        }
        sql
    }

    fn compile_create_database(
        &self,
        name: &str,
        charset: Option<&str>,
        collation: Option<&str>,
    ) -> Result<String> {
        let mut sql = format!("create database {}", self.wrap_value(name));
        if let Some(charset) = charset {
            sql.push_str(&format!(" default character set {}", self.wrap_value(charset)));
        }
        if let Some(collation) = collation {
            sql.push_str(&format!(" default collate {}", self.wrap_value(collation)));
        }
        Ok(sql)
    }

    fn compile_drop_database_if_exists(&self, name: &str) -> Result<String> {
        Ok(format!("drop database if exists {}", self.wrap_value(name)))
    }

    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String> {
        let tables: Vec<String> = tables.iter().map(|t| self.wrap_value(t)).collect();
        vec![format!("drop table {}", tables.join(","))]
    }

    fn compile_drop_all_views(&self, views: &[String]) -> Vec<String> {
        let views: Vec<String> = views.iter().map(|v| self.wrap_value(v)).collect();
        vec![format!("drop view {}", views.join(","))]
    }

    fn compile_get_all_tables(&self, _target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::raw("SHOW FULL TABLES WHERE table_type = 'BASE TABLE'")
    }

    fn compile_get_all_views(&self, _target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::raw("SHOW FULL TABLES WHERE table_type = 'VIEW'")
    }

    fn compile_table_exists(&self, table: &str, target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::new(
            "select * from information_schema.tables where table_schema = ? and table_name = ? \
             and table_type = 'BASE TABLE'",
            vec![
                SqlValue::Text(target.database.clone()),
                SqlValue::Text(format!("{}{table}", self.table_prefix)),
            ],
        )
    }

    fn compile_column_listing(&self, table: &str, target: &SchemaTarget) -> CompiledStatement {
        CompiledStatement::new(
            "select column_name as `column_name` from information_schema.columns \
             where table_schema = ? and table_name = ?",
            vec![
                SqlValue::Text(target.database.clone()),
                SqlValue::Text(format!("{}{table}", self.table_prefix)),
            ],
        )
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        String::from("SET FOREIGN_KEY_CHECKS=1;")
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        String::from("SET FOREIGN_KEY_CHECKS=0;")
    }
}
