//! In-memory sink capturing every record for assertions.

use std::sync::{Mutex, MutexGuard, PoisonError};

use reqlog_telemetry::{LogLevel, LogRecord, LogSink};
use serde_json::Value;

/// Sink that keeps every record it receives, regardless of level.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in emission order.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Records emitted at `level`, in emission order.
    #[must_use]
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    /// Info-level records.
    #[must_use]
    pub fn infos(&self) -> Vec<LogRecord> {
        self.at_level(LogLevel::Info)
    }

    /// Error-level records.
    #[must_use]
    pub fn errors(&self) -> Vec<LogRecord> {
        self.at_level(LogLevel::Error)
    }

    /// Value of `key` in the `index`-th record's payload, if present.
    #[must_use]
    pub fn payload_value(&self, index: usize, key: &str) -> Option<Value> {
        self.lock()
            .get(index)
            .and_then(|record| record.payload.get(key).cloned())
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for RecordingSink {
    fn emit(&self, record: LogRecord) {
        self.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqlog_telemetry::Payload;
    use serde_json::json;

    #[test]
    fn recording_sink_keeps_order_and_levels() {
        let sink = RecordingSink::new();
        let mut payload = Payload::new();
        payload.insert("req".to_string(), json!({"url": "/"}));
        sink.info(payload.clone());
        sink.error(Payload::new());
        sink.info(Payload::new());

        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.infos().len(), 2);
        assert_eq!(sink.errors().len(), 1);
        assert_eq!(sink.payload_value(0, "req"), Some(json!({"url": "/"})));
        assert!(sink.payload_value(1, "req").is_none());

        sink.clear();
        assert!(sink.records().is_empty());
    }
}
