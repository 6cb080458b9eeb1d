//! Sink traits for structured facts and coarse audit messages.

use log::Level;
use serde_json::Value;

/// Receives one structured JSON fact per stage event (plan rows, apply
/// attempts/results, summaries).
pub trait FactsEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value);
}

/// Receives coarse human-oriented audit messages.
pub trait AuditSink {
    fn log(&self, level: Level, msg: &str);
}

/// Discards everything. Useful default for embedders that do their own
/// observability.
#[derive(Default)]
pub struct NullSink;

impl FactsEmitter for NullSink {
    fn emit(&self, _subsystem: &str, _event: &str, _decision: &str, _fields: Value) {}
}

impl AuditSink for NullSink {
    fn log(&self, _level: Level, _msg: &str) {}
}

/// Forwards facts and audit messages to the `log` facade.
#[derive(Default)]
pub struct LogSink;

impl FactsEmitter for LogSink {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        log::debug!(target: "drivestage::facts", "{subsystem} {event} {decision} {fields}");
    }
}

impl AuditSink for LogSink {
    fn log(&self, level: Level, msg: &str) {
        log::log!(target: "drivestage", level, "{msg}");
    }
}
