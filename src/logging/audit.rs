//! Stage-scoped emission of structured facts.
//!
//! Every fact carries a minimal envelope: `schema_version`, `ts`, `plan_id`,
//! `stage`, and `decision`. Stage-specific fields ride on top via
//! [`EventBuilder`].

use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::constants::FACTS_SCHEMA_VERSION;

use super::facts::FactsEmitter;

/// Current wall-clock time as an RFC 3339 string for fact envelopes.
#[must_use]
pub fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

pub(crate) struct AuditCtx<'a> {
    pub facts: &'a dyn FactsEmitter,
    pub plan_id: String,
    pub ts: String,
}

impl<'a> AuditCtx<'a> {
    pub(crate) fn new(facts: &'a dyn FactsEmitter, plan_id: String, ts: String) -> Self {
        Self { facts, plan_id, ts }
    }
}

/// Stage for typed fact emission.
#[derive(Clone, Copy, Debug)]
pub enum Stage {
    Plan,
    ApplyAttempt,
    ApplyResult,
    ApplySummary,
    Refresh,
}

impl Stage {
    const fn as_event(self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::ApplyAttempt => "apply.attempt",
            Stage::ApplyResult => "apply.result",
            Stage::ApplySummary => "apply.summary",
            Stage::Refresh => "refresh",
        }
    }
}

/// Decision severity for emitted facts.
#[derive(Clone, Copy, Debug)]
pub enum Decision {
    Success,
    Failure,
    Warn,
}

impl Decision {
    const fn as_str(self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
            Decision::Warn => "warn",
        }
    }
}

/// Builder facade over fact emission with a centralized envelope.
pub struct StageLogger<'a> {
    ctx: &'a AuditCtx<'a>,
}

impl<'a> StageLogger<'a> {
    pub(crate) fn new(ctx: &'a AuditCtx<'a>) -> Self {
        Self { ctx }
    }

    pub fn plan(&self) -> EventBuilder<'_> {
        EventBuilder::new(self.ctx, Stage::Plan)
    }
    pub fn apply_attempt(&self) -> EventBuilder<'_> {
        EventBuilder::new(self.ctx, Stage::ApplyAttempt)
    }
    pub fn apply_result(&self) -> EventBuilder<'_> {
        EventBuilder::new(self.ctx, Stage::ApplyResult)
    }
    pub fn apply_summary(&self) -> EventBuilder<'_> {
        EventBuilder::new(self.ctx, Stage::ApplySummary)
    }
    pub fn refresh(&self) -> EventBuilder<'_> {
        EventBuilder::new(self.ctx, Stage::Refresh)
    }
}

pub struct EventBuilder<'a> {
    ctx: &'a AuditCtx<'a>,
    stage: Stage,
    fields: serde_json::Map<String, Value>,
}

impl<'a> EventBuilder<'a> {
    fn new(ctx: &'a AuditCtx<'a>, stage: Stage) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("stage".to_string(), json!(stage.as_event()));
        Self { ctx, stage, fields }
    }

    /// Attach the operation id and position.
    pub fn op(mut self, op_id: impl Into<String>, index: usize) -> Self {
        self.fields.insert("op_id".into(), json!(op_id.into()));
        self.fields.insert("index".into(), json!(index));
        self
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn merge(mut self, extra: Value) -> Self {
        if let Some(obj) = extra.as_object() {
            for (k, v) in obj {
                self.fields.insert(k.clone(), v.clone());
            }
        }
        self
    }

    pub fn emit(self, decision: Decision) {
        let mut fields = self.fields;
        fields.insert("schema_version".into(), json!(FACTS_SCHEMA_VERSION));
        fields.insert("ts".into(), json!(self.ctx.ts));
        fields.insert("plan_id".into(), json!(self.ctx.plan_id));
        fields
            .entry("decision")
            .or_insert(json!(decision.as_str()));
        self.ctx.facts.emit(
            "drivestage",
            self.stage.as_event(),
            decision.as_str(),
            Value::Object(fields),
        );
    }

    pub fn emit_success(self) {
        self.emit(Decision::Success);
    }
    pub fn emit_failure(self) {
        self.emit(Decision::Failure);
    }
    pub fn emit_warn(self) {
        self.emit(Decision::Warn);
    }
}
