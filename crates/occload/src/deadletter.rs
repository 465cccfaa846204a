//! Append-only record of work that could not complete.

use chrono::{DateTime, Utc};
use occload_store::{ErrorClassification, Row};
use serde::Serialize;
use std::sync::RwLock;
use uuid::Uuid;

/// Snapshot of a task that exhausted its retries or hit a fatal error.
///
/// Created exactly once per failing terminal task and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetterRecord {
    /// Id of the task that failed.
    pub task_id: Uuid,
    /// Table the task was writing to.
    pub table: String,
    /// The rows the task carried, preserved for inspection or replay.
    pub rows: Vec<Row>,
    /// The classification of the final error.
    pub classification: ErrorClassification,
    /// The final error, rendered.
    pub error: String,
    /// Executions the task consumed before giving up.
    pub attempts_made: u32,
    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

/// Thread-safe, append-only sink for [`DeadLetterRecord`]s.
///
/// The core never mutates or deletes records; cleanup belongs to whatever
/// consumes the sink after a run. Appends take one short write-lock
/// critical section, so recording never blocks a worker for longer than a
/// bounded enqueue.
#[derive(Debug, Default)]
pub struct DeadLetterSink {
    records: RwLock<Vec<DeadLetterRecord>>,
}

impl DeadLetterSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn record(&self, record: DeadLetterRecord) {
        self.records.write().expect("dead letter lock").push(record);
    }

    /// Records appended within `[start, end)`, in append order.
    pub fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<DeadLetterRecord> {
        self.records
            .read()
            .expect("dead letter lock")
            .iter()
            .filter(|record| record.recorded_at >= start && record.recorded_at < end)
            .cloned()
            .collect()
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.records.read().expect("dead letter lock").len()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use occload_store::TransientCode;

    fn record_at(recorded_at: DateTime<Utc>) -> DeadLetterRecord {
        DeadLetterRecord {
            task_id: Uuid::new_v4(),
            table: "load_test".into(),
            rows: Vec::new(),
            classification: ErrorClassification::Retryable {
                code: TransientCode::OccConflict,
            },
            error: "occ conflict".into(),
            attempts_made: 5,
            recorded_at,
        }
    }

    #[test]
    fn test_append_and_len() {
        let sink = DeadLetterSink::new();
        assert!(sink.is_empty());

        sink.record(record_at(Utc::now()));
        sink.record(record_at(Utc::now()));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_query_range_is_half_open() {
        let sink = DeadLetterSink::new();
        let base = Utc::now();
        let at = |secs: i64| base + TimeDelta::seconds(secs);

        for offset in [0, 10, 20, 30] {
            sink.record(record_at(at(offset)));
        }

        // [10, 30): includes 10 and 20, excludes 0 and the end bound 30
        let hits = sink.query_range(at(10), at(30));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.recorded_at >= at(10)));
        assert!(hits.iter().all(|r| r.recorded_at < at(30)));
    }

    #[test]
    fn test_query_range_empty_window() {
        let sink = DeadLetterSink::new();
        let now = Utc::now();
        sink.record(record_at(now));

        assert!(sink.query_range(now, now).is_empty());
    }
}
