//! # loam
//!
//! Connections on top of the [`loam_core`] grammars.
//!
//! - [`ConnectionConfig`]: JSON-shaped connection configuration
//! - [`connectors`]: per-dialect session setup
//! - [`DatabaseConnection`]: statement execution, transactions and the
//!   query log, including pretend mode
//! - [`SchemaBuilder`]: blueprints and introspection
//! - [`DatabaseManager`]: named, lazily opened connections
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use loam::driver::RecordingDriver;
//! use loam::{ConnectionConfig, DatabaseManager};
//! use loam_core::Query;
//!
//! let driver = RecordingDriver::new();
//! let mut manager = DatabaseManager::new(Arc::new(driver.clone()));
//! manager.add_connection(
//!     "default",
//!     ConnectionConfig::for_driver("sqlite").with("database", ":memory:"),
//! );
//!
//! let connection = manager.connection(None).unwrap();
//! let queries = connection
//!     .pretend(|connection| {
//!         connection.delete(&Query::table("sessions").where_eq("user_id", 7))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(queries[0].query, "delete from \"sessions\" where \"user_id\" = ?");
//! assert!(driver.statements().is_empty());
//! ```

pub mod config;
pub mod configurations;
pub mod connection;
pub mod connectors;
pub mod driver;
pub mod error;
pub mod log;
pub mod manager;
pub mod options;
pub mod schema_builder;

pub use config::ConnectionConfig;
pub use connection::DatabaseConnection;
pub use connectors::Connector;
pub use driver::{DriverError, DriverFactory, PhysicalConnection};
pub use error::{Error, Result};
pub use log::{GlobalSequence, LocalSequence, QueryLogEntry, SequenceGenerator};
pub use manager::DatabaseManager;
pub use options::ConfigurationOptionsParser;
pub use schema_builder::SchemaBuilder;
