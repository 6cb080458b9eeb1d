//! Apply stage: executes a plan strictly sequentially against the store.
//!
//! Control flow per operation:
//! 1. Re-check the captured `modified_time` precondition against the live
//!    store; a mismatch records a `Conflict` failure and execution continues.
//! 2. Execute through the [`RemoteStore`] boundary, resolving placeholder
//!    ids produced by earlier operations in the same plan.
//! 3. Recoverable failures are recorded and skipped past; fatal failures
//!    record the failing operation and abort the remainder.
//!
//! Emits `apply.attempt`/`apply.result` facts per operation plus a final
//! `apply.summary`.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use log::Level;
use serde_json::json;
use uuid::Uuid;

use crate::adapters::RemoteStore;
use crate::logging::audit::AuditCtx;
use crate::logging::{now_iso, AuditSink, FactsEmitter, StageLogger};
use crate::types::{
    Error, OperationResult, OpStatus, Result, SyncPlan, SyncResult, SyncStatus, SyncSummary,
};

use super::Manager;

mod exec;

pub(super) fn run<S: RemoteStore, E: FactsEmitter, A: AuditSink>(
    mgr: &mut Manager<S, E, A>,
    plan: SyncPlan,
) -> Result<SyncResult> {
    let t0 = Instant::now();

    let mut seen: HashSet<Uuid> = HashSet::new();
    for op in &plan.operations {
        if !seen.insert(op.op_id) {
            return Err(Error::invalid_argument(format!(
                "duplicate operation id in plan: {}",
                op.op_id
            )));
        }
    }

    let tctx = AuditCtx::new(
        &mgr.facts as &dyn FactsEmitter,
        plan.plan_id.to_string(),
        now_iso(),
    );
    let slog = StageLogger::new(&tctx);
    mgr.audit.log(Level::Info, "apply: starting");

    let mut id_map: HashMap<Uuid, String> = HashMap::new();
    let mut results: Vec<OperationResult> = Vec::new();
    let mut status = SyncStatus::Completed;

    for op in &plan.operations {
        let kind = op.action.kind();
        slog.apply_attempt()
            .op(op.op_id.to_string(), op.index)
            .field("kind", json!(kind.to_string()))
            .emit_success();

        match exec::execute(&mut mgr.store, op, &mut id_map) {
            Ok(produced) => {
                slog.apply_result()
                    .op(op.op_id.to_string(), op.index)
                    .field("kind", json!(kind.to_string()))
                    .merge(json!({ "produced_id": &produced }))
                    .emit_success();
                results.push(OperationResult::applied(op.op_id, op.index, kind, produced));
            }
            Err(e) => {
                slog.apply_result()
                    .op(op.op_id.to_string(), op.index)
                    .field("kind", json!(kind.to_string()))
                    .field("error_id", json!(e.kind.id_str()))
                    .field("message", json!(&e.msg))
                    .emit_failure();
                let fatal = e.is_fatal();
                results.push(OperationResult::failed(op.op_id, op.index, kind, e));
                if fatal {
                    // The failing operation is recorded; the remainder is
                    // not attempted and gets no result rows.
                    status = SyncStatus::Aborted;
                    break;
                }
            }
        }
    }

    let summary = SyncSummary::tally(&results);
    let first_failure_index = results
        .iter()
        .find(|r| r.status == OpStatus::Failed)
        .map(|r| r.index);

    // The virtual views are stale relative to whatever just happened on the
    // store; drop all pending state and reload each snapshot best-effort.
    let snapshot_refreshed = refresh_snapshots(&mgr.store, &mut mgr.snapshots, &slog);

    let decision_ok = status == SyncStatus::Completed && summary.failed == 0;
    let summary_event = slog
        .apply_summary()
        .field("status", json!(format!("{status:?}")))
        .field("applied", json!(summary.applied))
        .field("failed", json!(summary.failed))
        .field("duration_ms", json!(t0.elapsed().as_millis() as u64))
        .field("snapshot_refreshed", json!(snapshot_refreshed));
    if decision_ok {
        summary_event.emit_success();
    } else {
        summary_event.emit_failure();
    }
    mgr.audit.log(Level::Info, "apply: finished");

    Ok(SyncResult {
        status,
        results,
        summary,
        first_failure_index,
        id_map,
        snapshot_refreshed,
        duration_ms: t0.elapsed().as_millis() as u64,
    })
}

// Takes the store and the snapshot list separately so the caller's stage
// logger, which borrows the facts sink, stays usable afterwards.
fn refresh_snapshots<S: RemoteStore>(
    store: &S,
    snapshots: &mut [crate::snapshot::Snapshot],
    slog: &StageLogger<'_>,
) -> bool {
    let mut all_refreshed = true;
    for snap in snapshots.iter_mut() {
        snap.clear_ops();
        let root_id = snap.root().to_string();
        match super::load_view(store, &root_id) {
            Ok((_, view)) => snap.reset(view),
            Err(e) => {
                all_refreshed = false;
                slog.refresh()
                    .field("root", json!(root_id))
                    .field("error_id", json!(e.kind.id_str()))
                    .field("message", json!(e.msg))
                    .emit_warn();
            }
        }
    }
    all_refreshed
}
