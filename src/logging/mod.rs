pub mod audit;
pub mod facts;

pub use audit::{now_iso, Decision, EventBuilder, Stage, StageLogger};
pub use facts::{AuditSink, FactsEmitter, LogSink, NullSink};
