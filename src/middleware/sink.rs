//! Structured record sinks.
//!
//! A debug handler's only side effect is handing [`LogRecord`]s to an
//! injected [`LogSink`]. [`TracingSink`] forwards them to the `tracing`
//! facade; [`MemorySink`] keeps them for inspection.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};

use super::config::LogLevel;

/// One leveled, named structured record.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: &'static str,
    pub fields: Map<String, Value>,
}

impl LogRecord {
    #[must_use]
    pub fn new(level: LogLevel, message: &'static str) -> Self {
        Self {
            level,
            message,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Merge the fields of a serializable snapshot into this record.
    /// Non-object values are ignored.
    #[must_use]
    pub fn with_snapshot<T: Serialize>(mut self, snapshot: &T) -> Self {
        if let Ok(Value::Object(fields)) = serde_json::to_value(snapshot) {
            self.fields.extend(fields);
        }
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of a field, or `""` when absent or not a string.
    #[must_use]
    pub fn str_field(&self, name: &str) -> &str {
        self.fields.get(name).and_then(Value::as_str).unwrap_or("")
    }
}

/// Write contract for debug records. Must be callable concurrently.
pub trait LogSink: Send + Sync + 'static {
    fn emit(&self, record: LogRecord);
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn emit(&self, record: LogRecord) {
        (**self).emit(record);
    }
}

/// Target of every event emitted by [`TracingSink`].
pub const TARGET: &str = "request_debug::record";

/// Emits each record as one `tracing` event under [`TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! emit_event {
    ($level:expr, $record:ident, $json:ident) => {
        tracing::event!(
            target: TARGET,
            $level,
            request_id = $record.str_field("request_id"),
            direction = $record.str_field("direction"),
            tag = $record.str_field("tag"),
            record = %$json,
            "{}",
            $record.message
        )
    };
}

impl LogSink for TracingSink {
    fn emit(&self, record: LogRecord) {
        let json = Value::Object(record.fields.clone());
        match record.level {
            LogLevel::Debug => emit_event!(tracing::Level::DEBUG, record, json),
            LogLevel::Info => emit_event!(tracing::Level::INFO, record, json),
            LogLevel::Warn => emit_event!(tracing::Level::WARN, record, json),
            LogLevel::Error => emit_event!(tracing::Level::ERROR, record, json),
        }
    }
}

/// Collects records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records whose message equals `message`.
    #[must_use]
    pub fn named(&self, message: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.message == message)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
