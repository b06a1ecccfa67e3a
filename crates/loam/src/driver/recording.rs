//! A driver that records statements instead of running them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use loam_core::{Row, SqlValue};

use super::{ConnectParams, DriverError, DriverFactory, PhysicalConnection, StatementResult};

/// A statement received by a [`RecordingDriver`] handle.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    /// SQL text.
    pub sql: String,
    /// Bound values.
    pub bindings: Vec<SqlValue>,
}

#[derive(Debug, Default)]
struct State {
    statements: Vec<RecordedStatement>,
    responses: VecDeque<Vec<Row>>,
    failures: Vec<String>,
    open_failure: Option<String>,
    rows_affected: u64,
    last_insert_id: i64,
    opened: usize,
    closed: usize,
    last_params: Option<ConnectParams>,
}

/// In-memory driver for tests.
///
/// Every handle it opens shares one recorder: statements are recorded in
/// order, `select`s pop queued responses (FIFO, empty once drained), and
/// statements containing a registered substring fail. Clones share state.
///
/// ```
/// use loam::driver::{ConnectParams, DriverFactory, RecordingDriver};
/// use loam_core::{Driver, Row};
///
/// let driver = RecordingDriver::new();
/// driver.push_response(vec![Row::new().with("n", 1)]);
///
/// let params = ConnectParams {
///     driver: Driver::Sqlite,
///     host: None,
///     port: None,
///     database: String::from(":memory:"),
///     username: None,
///     password: None,
///     options: String::new(),
/// };
/// let mut handle = driver.open(&params).unwrap();
/// let rows = handle.select("select 1 as n", &[]).unwrap();
///
/// assert_eq!(rows.len(), 1);
/// assert_eq!(driver.sql_log(), vec!["select 1 as n"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    state: Arc<Mutex<State>>,
}

impl RecordingDriver {
    /// Creates a driver with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.lock().rows_affected = 1;
        driver
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues rows for the next `select`.
    pub fn push_response(&self, rows: Vec<Row>) {
        self.lock().responses.push_back(rows);
    }

    /// Fails every statement whose SQL contains `pattern`.
    pub fn fail_on(&self, pattern: &str) {
        self.lock().failures.push(pattern.to_string());
    }

    /// Fails every subsequent `open`.
    pub fn fail_open(&self, message: &str) {
        self.lock().open_failure = Some(message.to_string());
    }

    /// Row count reported by `execute`.
    pub fn set_rows_affected(&self, rows: u64) {
        self.lock().rows_affected = rows;
    }

    /// All statements received so far.
    #[must_use]
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.lock().statements.clone()
    }

    /// SQL text of all statements received so far.
    #[must_use]
    pub fn sql_log(&self) -> Vec<String> {
        self.lock()
            .statements
            .iter()
            .map(|statement| statement.sql.clone())
            .collect()
    }

    /// Forgets recorded statements.
    pub fn clear(&self) {
        self.lock().statements.clear();
    }

    /// Handles opened so far.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    /// Handles dropped so far.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    /// Handles currently open.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        let state = self.lock();
        state.opened - state.closed
    }

    /// Parameters of the last `open` call.
    #[must_use]
    pub fn last_params(&self) -> Option<ConnectParams> {
        self.lock().last_params.clone()
    }
}

impl DriverFactory for RecordingDriver {
    fn open(&self, params: &ConnectParams) -> Result<Box<dyn PhysicalConnection>, DriverError> {
        let mut state = self.lock();
        state.last_params = Some(params.clone());
        if let Some(message) = &state.open_failure {
            return Err(DriverError::new(message.clone()));
        }
        state.opened += 1;
        Ok(Box::new(RecordingConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct RecordingConnection {
    state: Arc<Mutex<State>>,
}

impl RecordingConnection {
    fn record(&self, sql: &str, bindings: &[SqlValue]) -> Result<MutexGuard<'_, State>, DriverError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.statements.push(RecordedStatement {
            sql: sql.to_string(),
            bindings: bindings.to_vec(),
        });
        if state.failures.iter().any(|pattern| sql.contains(pattern.as_str())) {
            return Err(DriverError::new(format!("statement rejected: {sql}")).with_code("HY000"));
        }
        Ok(state)
    }
}

impl PhysicalConnection for RecordingConnection {
    fn select(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>, DriverError> {
        let mut state = self.record(sql, bindings)?;
        Ok(state.responses.pop_front().unwrap_or_default())
    }

    fn execute(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<StatementResult, DriverError> {
        let mut state = self.record(sql, bindings)?;
        let is_insert = sql.trim_start().to_ascii_lowercase().starts_with("insert");
        let last_insert_id = if is_insert {
            state.last_insert_id += 1;
            Some(state.last_insert_id)
        } else {
            None
        };
        Ok(StatementResult {
            rows_affected: state.rows_affected,
            last_insert_id,
        })
    }

    fn execute_unprepared(&mut self, sql: &str) -> Result<(), DriverError> {
        self.record(sql, &[]).map(drop)
    }
}

impl Drop for RecordingConnection {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed += 1;
    }
}

#[cfg(test)]
mod tests {
    use loam_core::Driver;

    use super::*;

    fn params() -> ConnectParams {
        ConnectParams {
            driver: Driver::MySql,
            host: Some(String::from("localhost")),
            port: Some(3306),
            database: String::from("app"),
            username: None,
            password: None,
            options: String::new(),
        }
    }

    #[test]
    fn test_dropping_a_handle_closes_it() {
        let driver = RecordingDriver::new();
        let handle = driver.open(&params()).unwrap();
        assert_eq!(driver.live_handles(), 1);
        drop(handle);
        assert_eq!(driver.live_handles(), 0);
        assert_eq!(driver.closed(), 1);
    }

    #[test]
    fn test_failing_statement_is_still_recorded() {
        let driver = RecordingDriver::new();
        driver.fail_on("boom");
        let mut handle = driver.open(&params()).unwrap();
        let err = handle.execute_unprepared("select boom").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("HY000"));
        assert_eq!(driver.sql_log(), vec!["select boom"]);
    }

    #[test]
    fn test_inserts_report_increasing_ids() {
        let driver = RecordingDriver::new();
        let mut handle = driver.open(&params()).unwrap();
        let first = handle.execute("insert into t default values", &[]).unwrap();
        let second = handle.execute("insert into t default values", &[]).unwrap();
        assert_eq!(first.last_insert_id, Some(1));
        assert_eq!(second.last_insert_id, Some(2));
        assert_eq!(handle.execute("delete from t", &[]).unwrap().last_insert_id, None);
    }

    #[test]
    fn test_open_failure() {
        let driver = RecordingDriver::new();
        driver.fail_open("refused");
        assert!(driver.open(&params()).is_err());
        assert_eq!(driver.opened(), 0);
        assert_eq!(driver.last_params(), Some(params()));
    }
}
