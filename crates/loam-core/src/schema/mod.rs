//! Schema blueprints and their dialect grammars.

mod blueprint;
mod column;
pub mod grammar;

pub use blueprint::{Blueprint, Command, ForeignKey, IndexCommand};
pub use column::{ColumnDefinition, ColumnType, IndexKind};

/// Where introspection queries look: the connection's database and, on
/// PostgreSQL, its search path schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTarget {
    /// Database (catalog) name.
    pub database: String,
    /// Schemas to search, first one preferred.
    pub schemas: Vec<String>,
}

impl SchemaTarget {
    /// Creates a target for `database` with no explicit schemas.
    #[must_use]
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            schemas: Vec::new(),
        }
    }

    /// Sets the schemas to search.
    #[must_use]
    pub fn with_schemas<S, I>(mut self, schemas: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    /// Preferred schema, `public` when none is configured.
    #[must_use]
    pub fn default_schema(&self) -> &str {
        self.schemas.first().map_or("public", String::as_str)
    }
}
