//! Query log and the order ids stamped on its entries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loam_core::SqlValue;
use serde::Serialize;

/// A logged statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryLogEntry {
    /// Order id; strictly increasing across every log sharing a sequence.
    pub order: u64,
    /// SQL text.
    pub query: String,
    /// Bound values.
    pub bindings: Vec<SqlValue>,
    /// Execution time; `None` for statements that were only pretended.
    pub elapsed: Option<Duration>,
}

/// Source of log order ids.
pub trait SequenceGenerator: Send + Sync {
    /// Returns the next id. Ids never repeat and strictly increase.
    fn next_id(&self) -> u64;
}

static GLOBAL_ORDER: AtomicU64 = AtomicU64::new(0);

/// Process-wide sequence shared by every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSequence;

impl SequenceGenerator for GlobalSequence {
    fn next_id(&self) -> u64 {
        GLOBAL_ORDER.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Sequence private to its owners, starting at 1.
#[derive(Debug, Default)]
pub struct LocalSequence(AtomicU64);

impl LocalSequence {
    /// Creates a sequence whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }
}

impl SequenceGenerator for LocalSequence {
    fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// A connection's query log.
pub struct QueryLog {
    entries: Vec<QueryLogEntry>,
    enabled: bool,
    sequence: Arc<dyn SequenceGenerator>,
}

impl QueryLog {
    /// Creates a disabled log drawing ids from `sequence`.
    #[must_use]
    pub fn new(sequence: Arc<dyn SequenceGenerator>) -> Self {
        Self {
            entries: Vec::new(),
            enabled: false,
            sequence,
        }
    }

    /// Whether statements are being recorded.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts or stops recording. Existing entries are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Records a statement when enabled.
    pub fn record(&mut self, query: &str, bindings: &[SqlValue], elapsed: Option<Duration>) {
        if !self.enabled {
            return;
        }
        self.entries.push(QueryLogEntry {
            order: self.sequence.next_id(),
            query: query.to_string(),
            bindings: bindings.to_vec(),
            elapsed,
        });
    }

    /// Recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[QueryLogEntry] {
        &self.entries
    }

    /// Removes and returns every entry.
    pub fn take(&mut self) -> Vec<QueryLogEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Replaces the entries, returning the previous ones.
    pub fn replace(&mut self, entries: Vec<QueryLogEntry>) -> Vec<QueryLogEntry> {
        std::mem::replace(&mut self.entries, entries)
    }

    /// Sets the sequence used for new entries.
    pub fn set_sequence(&mut self, sequence: Arc<dyn SequenceGenerator>) {
        self.sequence = sequence;
    }
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new(Arc::new(GlobalSequence))
    }
}

impl std::fmt::Debug for QueryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryLog")
            .field("entries", &self.entries)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_log_records_nothing() {
        let mut log = QueryLog::default();
        log.record("select 1", &[], None);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_logs_sharing_a_sequence_interleave() {
        let sequence: Arc<dyn SequenceGenerator> = Arc::new(LocalSequence::new());
        let mut first = QueryLog::new(Arc::clone(&sequence));
        let mut second = QueryLog::new(sequence);
        first.set_enabled(true);
        second.set_enabled(true);

        first.record("a", &[], None);
        second.record("b", &[], None);
        first.record("c", &[], None);

        let orders: Vec<u64> = first.entries().iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![1, 3]);
        assert_eq!(second.entries()[0].order, 2);
    }

    #[test]
    fn test_global_sequence_increases() {
        let a = GlobalSequence.next_id();
        let b = GlobalSequence.next_id();
        assert!(b > a);
    }

    #[test]
    fn test_entry_serializes() {
        let entry = QueryLogEntry {
            order: 4,
            query: String::from("select ?"),
            bindings: vec![SqlValue::Int(1)],
            elapsed: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["order"], 4);
        assert_eq!(json["bindings"][0], 1);
    }
}
