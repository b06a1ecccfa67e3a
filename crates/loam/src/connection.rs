//! A named database connection: one physical handle plus the grammars,
//! processor and query log of its dialect.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use loam_core::query::grammar::QueryGrammar;
use loam_core::schema::grammar::SchemaGrammar;
use loam_core::{CompiledStatement, Driver, Processor, Query, Record, Row, SqlValue};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::configurations::parse_driver_config;
use crate::connectors::{connector_for, Connector};
use crate::driver::{DriverError, DriverFactory, PhysicalConnection};
use crate::error::{Error, Result};
use crate::log::{QueryLog, QueryLogEntry, SequenceGenerator};
use crate::schema_builder::SchemaBuilder;

/// A logical connection.
///
/// Statements are compiled by the dialect's grammar, checked for a
/// placeholder/binding mismatch, then run on the physical handle. While
/// pretending, statements are compiled and logged but never reach the
/// driver.
pub struct DatabaseConnection {
    name: String,
    driver: Driver,
    config: ConnectionConfig,
    connector: Box<dyn Connector>,
    query_grammar: Box<dyn QueryGrammar>,
    schema_grammar: Box<dyn SchemaGrammar>,
    processor: Box<dyn Processor>,
    handle: Option<Box<dyn PhysicalConnection>>,
    log: QueryLog,
    pretending: bool,
    transactions: u32,
}

impl DatabaseConnection {
    /// Validates `config`, connects and configures the session.
    pub fn open(
        name: &str,
        config: &ConnectionConfig,
        factory: Arc<dyn DriverFactory>,
    ) -> Result<Self> {
        let driver = config.driver()?;
        let config = parse_driver_config(driver, config)?;
        let connector = connector_for(driver, factory);
        let handle = connector.connect(name, &config)?;
        let prefix = config.prefix();

        Ok(Self {
            name: name.to_string(),
            driver,
            query_grammar: driver.query_grammar(prefix),
            schema_grammar: driver.schema_grammar(prefix),
            processor: driver.processor(),
            connector,
            config,
            handle: Some(handle),
            log: QueryLog::default(),
            pretending: false,
            transactions: 0,
        })
    }

    /// Draws query log order ids from `sequence` instead of the global one.
    #[must_use]
    pub fn with_sequence(mut self, sequence: Arc<dyn SequenceGenerator>) -> Self {
        self.log.set_sequence(sequence);
        self
    }

    /// Logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dialect.
    #[must_use]
    pub const fn driver(&self) -> Driver {
        self.driver
    }

    /// Normalized configuration.
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Table prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        self.config.prefix()
    }

    /// Query grammar.
    #[must_use]
    pub fn query_grammar(&self) -> &dyn QueryGrammar {
        self.query_grammar.as_ref()
    }

    /// Schema grammar.
    #[must_use]
    pub fn schema_grammar(&self) -> &dyn SchemaGrammar {
        self.schema_grammar.as_ref()
    }

    /// Result processor.
    #[must_use]
    pub fn processor(&self) -> &dyn Processor {
        self.processor.as_ref()
    }

    /// Schema builder over this connection.
    pub fn schema(&mut self) -> SchemaBuilder<'_> {
        SchemaBuilder::new(self)
    }

    // ==================== Reads ====================

    /// Runs a select and returns its rows.
    pub fn select(&mut self, query: &Query) -> Result<Vec<Row>> {
        let compiled = self.query_grammar.compile_select(query)?;
        self.select_statement(&compiled)
    }

    /// First row of a select.
    pub fn select_one(&mut self, query: &Query) -> Result<Option<Row>> {
        let rows = self.select(&query.clone().limit(1))?;
        Ok(rows.into_iter().next())
    }

    /// First column of the first row.
    pub fn scalar(&mut self, query: &Query) -> Result<Option<SqlValue>> {
        Ok(self
            .select_one(query)?
            .and_then(|row| row.get_index(0).cloned()))
    }

    /// Whether the query matches any row.
    pub fn exists(&mut self, query: &Query) -> Result<bool> {
        let compiled = self.query_grammar.compile_exists(query)?;
        let rows = self.select_statement(&compiled)?;
        Ok(is_truthy(&rows))
    }

    /// Runs raw SQL that returns rows.
    pub fn select_raw(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>> {
        self.select_statement(&CompiledStatement::new(sql, bindings.to_vec()))
    }

    /// Runs a compiled statement that returns rows.
    pub fn select_statement(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        statement.validate()?;
        self.run(&statement.sql, &statement.bindings, Vec::new(), |handle, sql, bindings| {
            handle.select(sql, bindings)
        })
    }

    // ==================== Writes ====================

    /// Inserts records.
    pub fn insert(&mut self, query: &Query, records: &[Record]) -> Result<bool> {
        let compiled = self.query_grammar.compile_insert(query, records)?;
        self.affecting(&compiled).map(|_| true)
    }

    /// Inserts records, skipping rows that violate unique constraints.
    /// Returns the number of rows inserted.
    pub fn insert_or_ignore(&mut self, query: &Query, records: &[Record]) -> Result<u64> {
        let compiled = self.query_grammar.compile_insert_or_ignore(query, records)?;
        self.affecting(&compiled)
    }

    /// Inserts one record and returns its generated key.
    ///
    /// PostgreSQL reads the key from a `returning` clause, the other
    /// dialects from the driver. `None` while pretending.
    pub fn insert_get_id(
        &mut self,
        query: &Query,
        record: &Record,
        sequence: Option<&str>,
    ) -> Result<Option<i64>> {
        let compiled = self
            .query_grammar
            .compile_insert_get_id(query, record, sequence)?;
        compiled.validate()?;
        if self.driver == Driver::Postgres {
            let rows = self.select_statement(&compiled)?;
            return Ok(self.processor.process_insert_get_id(&rows, sequence));
        }
        let result = self.run(&compiled.sql, &compiled.bindings, None, |handle, sql, bindings| {
            handle.execute(sql, bindings).map(Some)
        })?;
        Ok(result.and_then(|result| result.last_insert_id))
    }

    /// Inserts records or updates `update` columns when a row with the same
    /// `unique_by` key exists.
    pub fn upsert(
        &mut self,
        query: &Query,
        records: &[Record],
        unique_by: &[&str],
        update: &[&str],
    ) -> Result<u64> {
        let compiled = self
            .query_grammar
            .compile_upsert(query, records, unique_by, update)?;
        self.affecting(&compiled)
    }

    /// Updates matching rows.
    pub fn update(&mut self, query: &Query, values: &Record) -> Result<u64> {
        let compiled = self.query_grammar.compile_update(query, values)?;
        self.affecting(&compiled)
    }

    /// Deletes matching rows.
    pub fn delete(&mut self, query: &Query) -> Result<u64> {
        let compiled = self.query_grammar.compile_delete(query)?;
        self.affecting(&compiled)
    }

    /// Empties the query's table and resets its generated keys where the
    /// dialect keeps them apart from the table.
    pub fn truncate(&mut self, query: &Query) -> Result<()> {
        for statement in self.query_grammar.compile_truncate(query)? {
            self.affecting(&statement)?;
        }
        if let Some(reset) = self.query_grammar.compile_sequence_reset(query) {
            if self.pretending || is_truthy(&self.select_statement(&reset.exists)?) {
                self.affecting(&reset.reset)?;
            }
        }
        Ok(())
    }

    // ==================== Raw statements ====================

    /// Runs a prepared statement.
    pub fn statement(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<bool> {
        self.affecting_statement(sql, bindings).map(|_| true)
    }

    /// Runs a prepared statement and returns the affected row count.
    pub fn affecting_statement(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        self.affecting(&CompiledStatement::new(sql, bindings.to_vec()))
    }

    /// Runs SQL without preparing it. No placeholders are substituted.
    pub fn unprepared(&mut self, sql: &str) -> Result<bool> {
        self.run(sql, &[], true, |handle, sql, _| {
            handle.execute_unprepared(sql).map(|()| true)
        })
    }

    fn affecting(&mut self, statement: &CompiledStatement) -> Result<u64> {
        statement.validate()?;
        self.run(&statement.sql, &statement.bindings, 0, |handle, sql, bindings| {
            handle.execute(sql, bindings).map(|result| result.rows_affected)
        })
    }

    // ==================== Transactions ====================

    /// Starts a transaction, or a savepoint when one is already open.
    pub fn begin_transaction(&mut self) -> Result<()> {
        let sql = if self.transactions == 0 {
            self.query_grammar.compile_begin_transaction()
        } else {
            self.query_grammar
                .compile_savepoint(&savepoint_name(self.transactions + 1))
        };
        self.unprepared(&sql)?;
        self.transactions += 1;
        Ok(())
    }

    /// Commits the outermost transaction; nested levels only close.
    pub fn commit(&mut self) -> Result<()> {
        if self.transactions == 1 {
            let sql = self.query_grammar.compile_commit();
            self.unprepared(&sql)?;
        }
        self.transactions = self.transactions.saturating_sub(1);
        Ok(())
    }

    /// Rolls back the innermost transaction level.
    pub fn roll_back(&mut self) -> Result<()> {
        match self.transactions {
            0 => return Ok(()),
            1 => {
                let sql = self.query_grammar.compile_rollback();
                self.unprepared(&sql)?;
            }
            level => {
                let sql = self
                    .query_grammar
                    .compile_rollback_to_savepoint(&savepoint_name(level));
                self.unprepared(&sql)?;
            }
        }
        self.transactions -= 1;
        Ok(())
    }

    /// Runs `callback` in a transaction, rolling back when it fails.
    pub fn transaction<T>(&mut self, callback: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin_transaction()?;
        match callback(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(error) => {
                self.roll_back()?;
                Err(error)
            }
        }
    }

    /// Open transaction levels.
    #[must_use]
    pub const fn transaction_level(&self) -> u32 {
        self.transactions
    }

    // ==================== Query log ====================

    /// Starts recording statements.
    pub fn enable_query_log(&mut self) {
        self.log.set_enabled(true);
    }

    /// Stops recording statements. Recorded entries are kept.
    pub fn disable_query_log(&mut self) {
        self.log.set_enabled(false);
    }

    /// Whether statements are being recorded.
    #[must_use]
    pub const fn logging(&self) -> bool {
        self.log.is_enabled()
    }

    /// Recorded entries, oldest first.
    #[must_use]
    pub fn query_log(&self) -> &[QueryLogEntry] {
        self.log.entries()
    }

    /// Removes and returns every recorded entry.
    pub fn flush_query_log(&mut self) -> Vec<QueryLogEntry> {
        self.log.take()
    }

    /// Whether statements are being pretended.
    #[must_use]
    pub const fn pretending(&self) -> bool {
        self.pretending
    }

    /// Runs `callback` with logging enabled on an empty log. The previous
    /// entries and flags come back on every exit path, panics included.
    pub fn with_fresh_query_log<T>(&mut self, callback: impl FnOnce(&mut Self) -> T) -> T {
        let mut scope = FreshQueryLog::new(self);
        callback(&mut *scope)
    }

    /// Runs `callback` without touching the database and returns the
    /// statements it would have run.
    pub fn pretend(
        &mut self,
        callback: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<Vec<QueryLogEntry>> {
        self.with_fresh_query_log(|connection| {
            connection.pretending = true;
            callback(connection)?;
            Ok(connection.flush_query_log())
        })
    }

    // ==================== Lifecycle ====================

    /// Whether a physical handle is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the physical handle. The next statement reconnects.
    pub fn disconnect(&mut self) {
        if self.handle.take().is_some() {
            info!(connection = %self.name, "Connection closed");
        }
        self.transactions = 0;
    }

    /// Replaces the physical handle with a freshly configured one.
    pub fn reconnect(&mut self) -> Result<()> {
        self.disconnect();
        self.handle = Some(self.connector.connect(&self.name, &self.config)?);
        Ok(())
    }

    fn physical(&mut self) -> Result<&mut Box<dyn PhysicalConnection>> {
        if self.handle.is_none() {
            self.reconnect()?;
        }
        self.handle.as_mut().ok_or_else(|| Error::Connection {
            connection: self.name.clone(),
            message: String::from("no open handle"),
            source: None,
        })
    }

    /// Runs one statement: skipped while pretending, timed and logged
    /// otherwise.
    fn run<T>(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
        pretended: T,
        op: impl FnOnce(
            &mut Box<dyn PhysicalConnection>,
            &str,
            &[SqlValue],
        ) -> std::result::Result<T, DriverError>,
    ) -> Result<T> {
        if self.pretending {
            debug!(connection = %self.name, sql = %sql, "Pretending SQL");
            self.log.record(sql, bindings, None);
            return Ok(pretended);
        }

        let started = Instant::now();
        let result = op(self.physical()?, sql, bindings);
        let elapsed = started.elapsed();
        debug!(
            connection = %self.name,
            sql = %sql,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Executed SQL"
        );

        match result {
            Ok(value) => {
                self.log.record(sql, bindings, Some(elapsed));
                Ok(value)
            }
            Err(source) => Err(Error::Execution {
                sql: sql.to_string(),
                bindings: bindings.to_vec(),
                driver: self.driver,
                source,
            }),
        }
    }
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .field("connected", &self.handle.is_some())
            .field("pretending", &self.pretending)
            .field("transactions", &self.transactions)
            .finish_non_exhaustive()
    }
}

/// Whether the first column of the first row is a non-zero integer.
fn is_truthy(rows: &[Row]) -> bool {
    rows.first()
        .and_then(|row| row.get_index(0))
        .and_then(SqlValue::as_i64)
        .is_some_and(|found| found != 0)
}

fn savepoint_name(level: u32) -> String {
    format!("trans{level}")
}

/// Swaps in an empty, enabled query log and restores the previous log,
/// logging flag and pretend flag when dropped.
struct FreshQueryLog<'a> {
    connection: &'a mut DatabaseConnection,
    entries: Vec<QueryLogEntry>,
    logging: bool,
    pretending: bool,
}

impl<'a> FreshQueryLog<'a> {
    fn new(connection: &'a mut DatabaseConnection) -> Self {
        let logging = connection.log.is_enabled();
        let pretending = connection.pretending;
        let entries = connection.log.take();
        connection.log.set_enabled(true);
        Self {
            connection,
            entries,
            logging,
            pretending,
        }
    }
}

impl Deref for FreshQueryLog<'_> {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        self.connection
    }
}

impl DerefMut for FreshQueryLog<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
    }
}

impl Drop for FreshQueryLog<'_> {
    fn drop(&mut self) {
        self.connection.log.replace(std::mem::take(&mut self.entries));
        self.connection.log.set_enabled(self.logging);
        self.connection.pretending = self.pretending;
    }
}

#[cfg(test)]
mod tests {
    use crate::driver::RecordingDriver;

    use super::*;

    fn memory(driver: &RecordingDriver) -> DatabaseConnection {
        let config = ConnectionConfig::for_driver("sqlite").with("database", ":memory:");
        DatabaseConnection::open("test", &config, Arc::new(driver.clone())).unwrap()
    }

    #[test]
    fn test_nested_transactions_use_savepoints() {
        let driver = RecordingDriver::new();
        let mut connection = memory(&driver);

        connection.begin_transaction().unwrap();
        connection.begin_transaction().unwrap();
        connection.roll_back().unwrap();
        connection.commit().unwrap();

        assert_eq!(
            driver.sql_log(),
            vec!["begin", "savepoint \"trans2\"", "rollback to savepoint \"trans2\"", "commit"]
        );
        assert_eq!(connection.transaction_level(), 0);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let driver = RecordingDriver::new();
        let mut connection = memory(&driver);

        let result: Result<()> = connection.transaction(|connection| {
            connection.statement("delete from t", &[])?;
            Err(Error::configuration("stop"))
        });

        assert!(result.is_err());
        assert_eq!(driver.sql_log(), vec!["begin", "delete from t", "rollback"]);
    }

    #[test]
    fn test_disconnected_connection_reconnects_lazily() {
        let driver = RecordingDriver::new();
        let mut connection = memory(&driver);
        connection.disconnect();
        assert!(!connection.is_connected());
        assert_eq!(driver.live_handles(), 0);

        connection.statement("select 1", &[]).unwrap();
        assert!(connection.is_connected());
        assert_eq!(driver.opened(), 2);
    }

    #[test]
    fn test_fresh_log_is_restored_after_panic() {
        let driver = RecordingDriver::new();
        let mut connection = memory(&driver);
        connection.enable_query_log();
        connection.statement("select 1", &[]).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            connection.with_fresh_query_log(|connection| {
                connection.statement("select 2", &[]).unwrap();
                assert!(!connection.logging(), "callback failed");
            })
        }));

        assert!(outcome.is_err());
        assert_eq!(connection.query_log().len(), 1);
        assert_eq!(connection.query_log()[0].query, "select 1");
        assert!(connection.logging());
    }
}
