//! The closed set of supported database drivers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::UnknownDriver;
use crate::processor::{MySqlProcessor, PostgresProcessor, Processor, SqliteProcessor};
use crate::query::grammar::{MySqlGrammar, PostgresGrammar, QueryGrammar, SqliteGrammar};
use crate::schema::grammar::{
    MySqlSchemaGrammar, PostgresSchemaGrammar, SchemaGrammar, SqliteSchemaGrammar,
};

/// A database driver. Selects exactly one grammar/processor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite 3.
    Sqlite,
}

impl Driver {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "pgsql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Human readable dialect name, used in error messages.
    #[must_use]
    pub const fn dialect_name(self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }

    /// Creates the query grammar for this driver.
    #[must_use]
    pub fn query_grammar(self, table_prefix: &str) -> Box<dyn QueryGrammar> {
        match self {
            Self::MySql => Box::new(MySqlGrammar::with_prefix(table_prefix)),
            Self::Postgres => Box::new(PostgresGrammar::with_prefix(table_prefix)),
            Self::Sqlite => Box::new(SqliteGrammar::with_prefix(table_prefix)),
        }
    }

    /// Creates the schema grammar for this driver.
    #[must_use]
    pub fn schema_grammar(self, table_prefix: &str) -> Box<dyn SchemaGrammar> {
        match self {
            Self::MySql => Box::new(MySqlSchemaGrammar::with_prefix(table_prefix)),
            Self::Postgres => Box::new(PostgresSchemaGrammar::with_prefix(table_prefix)),
            Self::Sqlite => Box::new(SqliteSchemaGrammar::with_prefix(table_prefix)),
        }
    }

    /// Creates the result processor for this driver.
    #[must_use]
    pub fn processor(self) -> Box<dyn Processor> {
        match self {
            Self::MySql => Box::new(MySqlProcessor),
            Self::Postgres => Box::new(PostgresProcessor),
            Self::Sqlite => Box::new(SqliteProcessor),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Driver {
    type Err = UnknownDriver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" | "qmysql" => Ok(Self::MySql),
            "pgsql" | "postgres" | "postgresql" | "qpsql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" | "qsqlite" => Ok(Self::Sqlite),
            _ => Err(UnknownDriver(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_driver_names() {
        assert_eq!("QMYSQL".parse::<Driver>(), Ok(Driver::MySql));
        assert_eq!("postgres".parse::<Driver>(), Ok(Driver::Postgres));
        assert_eq!(" sqlite ".parse::<Driver>(), Ok(Driver::Sqlite));
        assert_eq!(
            "oracle".parse::<Driver>(),
            Err(UnknownDriver(String::from("oracle")))
        );
    }
}
