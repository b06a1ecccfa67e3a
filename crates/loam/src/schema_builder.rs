//! Runs schema blueprints and introspection queries on a connection.

use loam_core::{Blueprint, Driver, SchemaTarget};

use crate::config::keys;
use crate::configurations::{dont_drop, search_path};
use crate::connection::DatabaseConnection;
use crate::error::Result;

/// Schema operations over one connection.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use loam::driver::SqliteDriver;
/// use loam::{ConnectionConfig, DatabaseConnection};
///
/// let config = ConnectionConfig::for_driver("sqlite").with("database", ":memory:");
/// let mut connection =
///     DatabaseConnection::open("default", &config, Arc::new(SqliteDriver::new())).unwrap();
///
/// connection
///     .schema()
///     .create("users", |table| {
///         table.id();
///         table.string("email", 255).unique();
///     })
///     .unwrap();
/// assert!(connection.schema().has_table("users").unwrap());
/// ```
pub struct SchemaBuilder<'a> {
    connection: &'a mut DatabaseConnection,
}

impl<'a> SchemaBuilder<'a> {
    /// Creates a builder over `connection`.
    pub fn new(connection: &'a mut DatabaseConnection) -> Self {
        Self { connection }
    }

    /// The underlying connection.
    pub fn connection(&mut self) -> &mut DatabaseConnection {
        self.connection
    }

    // ==================== Tables ====================

    /// Creates a table.
    pub fn create(&mut self, table: &str, build: impl FnOnce(&mut Blueprint)) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.create();
        build(&mut blueprint);
        self.build(&blueprint)
    }

    /// Modifies an existing table.
    pub fn table(&mut self, table: &str, build: impl FnOnce(&mut Blueprint)) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        build(&mut blueprint);
        self.build(&blueprint)
    }

    /// Drops a table.
    pub fn drop(&mut self, table: &str) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop();
        self.build(&blueprint)
    }

    /// Drops a table when it exists.
    pub fn drop_if_exists(&mut self, table: &str) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop_if_exists();
        self.build(&blueprint)
    }

    /// Renames a table.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let mut blueprint = self.blueprint(from);
        blueprint.rename(to);
        self.build(&blueprint)
    }

    /// Compiles and runs a blueprint. Dialects with transactional DDL run
    /// multi-statement blueprints in one transaction.
    pub fn build(&mut self, blueprint: &Blueprint) -> Result<()> {
        let statements = self.connection.schema_grammar().compile(blueprint)?;
        let transactional =
            statements.len() > 1 && self.connection.schema_grammar().supports_schema_transactions();

        if transactional {
            self.connection.transaction(|connection| {
                for sql in &statements {
                    connection.statement(sql, &[])?;
                }
                Ok(())
            })
        } else {
            for sql in &statements {
                self.connection.statement(sql, &[])?;
            }
            Ok(())
        }
    }

    /// An empty blueprint carrying the connection's prefix and table
    /// defaults.
    #[must_use]
    pub fn blueprint(&self, table: &str) -> Blueprint {
        let config = self.connection.config();
        let prefix = if config.get_bool(keys::PREFIX_INDEXES).unwrap_or(false) {
            config.prefix()
        } else {
            ""
        };
        let mut blueprint = Blueprint::with_prefix(table, prefix);
        blueprint.charset = config.get_text(keys::CHARSET);
        blueprint.collation = config.get_text(keys::COLLATION);
        blueprint.engine = config.get_text(keys::ENGINE);
        blueprint
    }

    // ==================== Introspection ====================

    /// Database and schemas searched by introspection queries.
    #[must_use]
    pub fn target(&self) -> SchemaTarget {
        let config = self.connection.config();
        let username = config.get_text(keys::USERNAME).unwrap_or_default();
        let schemas = search_path(config).into_iter().map(|schema| {
            if schema == "$user" {
                username.clone()
            } else {
                schema
            }
        });
        SchemaTarget::new(config.database()).with_schemas(schemas)
    }

    /// Whether the table exists.
    pub fn has_table(&mut self, table: &str) -> Result<bool> {
        let statement = self
            .connection
            .schema_grammar()
            .compile_table_exists(table, &self.target());
        Ok(!self.connection.select_statement(&statement)?.is_empty())
    }

    /// Column names of a table, in table order.
    pub fn get_column_listing(&mut self, table: &str) -> Result<Vec<String>> {
        let statement = self
            .connection
            .schema_grammar()
            .compile_column_listing(table, &self.target());
        let rows = self.connection.select_statement(&statement)?;
        Ok(self.connection.processor().process_column_listing(rows))
    }

    /// Whether the table has `column`, compared case-insensitively.
    pub fn has_column(&mut self, table: &str, column: &str) -> Result<bool> {
        self.has_columns(table, &[column])
    }

    /// Whether the table has every one of `columns`.
    pub fn has_columns(&mut self, table: &str, columns: &[&str]) -> Result<bool> {
        let listing: Vec<String> = self
            .get_column_listing(table)?
            .iter()
            .map(|column| column.to_lowercase())
            .collect();
        Ok(columns
            .iter()
            .all(|column| listing.contains(&column.to_lowercase())))
    }

    /// Names of every base table.
    pub fn get_all_tables(&mut self) -> Result<Vec<String>> {
        let statement = self
            .connection
            .schema_grammar()
            .compile_get_all_tables(&self.target());
        let rows = self.connection.select_statement(&statement)?;
        Ok(self.connection.processor().process_table_listing(rows))
    }

    /// Names of every view.
    pub fn get_all_views(&mut self) -> Result<Vec<String>> {
        let statement = self
            .connection
            .schema_grammar()
            .compile_get_all_views(&self.target());
        let rows = self.connection.select_statement(&statement)?;
        Ok(self.connection.processor().process_table_listing(rows))
    }

    // ==================== Bulk drops ====================

    /// Drops every table. PostgreSQL keeps the tables listed in
    /// `dont_drop`; MySQL drops with foreign key checks off.
    pub fn drop_all_tables(&mut self) -> Result<()> {
        let mut tables = self.get_all_tables()?;
        if self.connection.driver() == Driver::Postgres {
            let keep = dont_drop(self.connection.config());
            tables.retain(|table| !keep.contains(table));
        }
        if tables.is_empty() {
            return Ok(());
        }

        let statements = self.connection.schema_grammar().compile_drop_all_tables(&tables);
        let run = |builder: &mut Self| -> Result<()> {
            for sql in &statements {
                builder.connection.statement(sql, &[])?;
            }
            Ok(())
        };
        if self.connection.driver() == Driver::MySql {
            self.without_foreign_key_constraints(run)
        } else {
            run(self)
        }
    }

    /// Drops every view.
    pub fn drop_all_views(&mut self) -> Result<()> {
        let views = self.get_all_views()?;
        if views.is_empty() {
            return Ok(());
        }
        for sql in self.connection.schema_grammar().compile_drop_all_views(&views) {
            self.connection.statement(&sql, &[])?;
        }
        Ok(())
    }

    // ==================== Databases ====================

    /// Creates a database with the connection's charset and collation.
    pub fn create_database(&mut self, name: &str) -> Result<()> {
        let config = self.connection.config();
        let charset = config.get_text(keys::CHARSET);
        let collation = config.get_text(keys::COLLATION);
        let sql = self.connection.schema_grammar().compile_create_database(
            name,
            charset.as_deref(),
            collation.as_deref(),
        )?;
        self.connection.statement(&sql, &[]).map(drop)
    }

    /// Drops a database when it exists.
    pub fn drop_database_if_exists(&mut self, name: &str) -> Result<()> {
        let sql = self
            .connection
            .schema_grammar()
            .compile_drop_database_if_exists(name)?;
        self.connection.statement(&sql, &[]).map(drop)
    }

    // ==================== Foreign keys ====================

    /// Turns foreign key enforcement on.
    pub fn enable_foreign_key_constraints(&mut self) -> Result<bool> {
        let sql = self
            .connection
            .schema_grammar()
            .compile_enable_foreign_key_constraints();
        self.connection.statement(&sql, &[])
    }

    /// Turns foreign key enforcement off.
    pub fn disable_foreign_key_constraints(&mut self) -> Result<bool> {
        let sql = self
            .connection
            .schema_grammar()
            .compile_disable_foreign_key_constraints();
        self.connection.statement(&sql, &[])
    }

    /// Runs `callback` with foreign key enforcement off. Enforcement is
    /// turned back on even when the callback fails.
    pub fn without_foreign_key_constraints<T>(
        &mut self,
        callback: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.disable_foreign_key_constraints()?;
        let result = callback(self);
        let enabled = self.enable_foreign_key_constraints();
        let value = result?;
        enabled?;
        Ok(value)
    }
}
