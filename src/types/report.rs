//! Per-operation and aggregate results of applying a plan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::errors::Error;
use super::plan::ActionKind;

/// Outcome of one applied operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpStatus {
    Applied,
    Skipped,
    Failed,
}

/// Outcome of one executed plan operation, in plan order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperationResult {
    pub op_id: Uuid,
    pub index: usize,
    pub kind: ActionKind,
    pub status: OpStatus,
    /// Present iff `status == Failed`.
    pub error: Option<Error>,
    /// Store-assigned id for create/copy/upload operations.
    pub produced_id: Option<String>,
}

impl OperationResult {
    pub(crate) fn applied(
        op_id: Uuid,
        index: usize,
        kind: ActionKind,
        produced_id: Option<String>,
    ) -> Self {
        Self {
            op_id,
            index,
            kind,
            status: OpStatus::Applied,
            error: None,
            produced_id,
        }
    }

    pub(crate) fn failed(op_id: Uuid, index: usize, kind: ActionKind, error: Error) -> Self {
        Self {
            op_id,
            index,
            kind,
            status: OpStatus::Failed,
            error: Some(error),
            produced_id: None,
        }
    }
}

/// Terminal status of one apply call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Every operation was attempted.
    Completed,
    /// A fatal error stopped the run; operations after the abort point were
    /// not attempted and have no result row.
    Aborted,
}

/// Counts of per-operation outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SyncSummary {
    pub(crate) fn tally(results: &[OperationResult]) -> Self {
        let mut s = Self::default();
        for r in results {
            match r.status {
                OpStatus::Applied => s.applied += 1,
                OpStatus::Failed => s.failed += 1,
                OpStatus::Skipped => s.skipped += 1,
            }
        }
        s
    }
}

/// Aggregate result of `apply_plan`. Never mutated after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncResult {
    pub status: SyncStatus,
    /// One entry per attempted operation, in plan order. An aborting
    /// operation is recorded as `Failed`; later operations are absent.
    pub results: Vec<OperationResult>,
    pub summary: SyncSummary,
    /// Index of the first `Failed` result, recoverable or fatal.
    pub first_failure_index: Option<usize>,
    /// Placeholder id -> store-assigned id for items created by this apply.
    pub id_map: HashMap<Uuid, String>,
    /// Whether every open snapshot was reloaded from the store afterwards.
    pub snapshot_refreshed: bool,
    pub duration_ms: u64,
}

impl SyncResult {
    /// Human-readable listing mirroring `SyncPlan::render`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "apply {:?}: {} applied, {} failed, {} skipped\n",
            self.status, self.summary.applied, self.summary.failed, self.summary.skipped
        );
        for r in &self.results {
            let detail = match (&r.error, &r.produced_id) {
                (Some(e), _) => format!("{} {}", e.kind.id_str(), e.msg),
                (None, Some(id)) => format!("-> {id}"),
                (None, None) => String::new(),
            };
            out.push_str(&format!(
                "  {:>3}. {:<16} {:<8} {}\n",
                r.index,
                r.kind.to_string(),
                format!("{:?}", r.status),
                detail
            ));
        }
        out
    }
}
