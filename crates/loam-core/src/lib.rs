//! # loam-core
//!
//! Dialect grammars for the loam database layer.
//!
//! This crate is pure: it never talks to a database. It provides:
//! - [`Query`] builder state compiled by a per-dialect
//!   [`QueryGrammar`](query::grammar::QueryGrammar)
//! - [`Blueprint`] table descriptions compiled by a per-dialect
//!   [`SchemaGrammar`](schema::grammar::SchemaGrammar)
//! - [`Processor`]s normalizing driver-specific result rows
//!
//! Every compiled statement carries its bindings in placeholder order:
//!
//! ```rust
//! use loam_core::{Driver, Query};
//!
//! let grammar = Driver::Sqlite.query_grammar("");
//! let compiled = grammar
//!     .compile_select(&Query::table("users").where_in("id", [1, 2]).limit(10))
//!     .unwrap();
//!
//! assert_eq!(
//!     compiled.sql,
//!     "select * from \"users\" where \"id\" in (?, ?) limit 10"
//! );
//! assert!(compiled.validate().is_ok());
//! ```

pub mod driver;
pub mod error;
pub mod grammar;
pub mod processor;
pub mod query;
pub mod row;
pub mod schema;
pub mod statement;
pub mod value;

pub use driver::Driver;
pub use error::{CompileError, Result, UnknownDriver};
pub use grammar::BaseGrammar;
pub use processor::Processor;
pub use query::{record, Query, Record};
pub use row::Row;
pub use schema::{Blueprint, SchemaTarget};
pub use statement::CompiledStatement;
pub use value::{raw, Expression, Param, SqlValue, ToSqlValue};
