//! Plan building: global ordering, deletion-run normalization, and
//! deterministic ids.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde_json::json;
use time::OffsetDateTime;

use crate::adapters::RemoteStore;
use crate::logging::audit::AuditCtx;
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::types::ids::{op_id, plan_id};
use crate::types::{Action, ItemId, PlanOperation, SyncPlan};

use super::Manager;

#[derive(Clone)]
struct Entry {
    seq: u64,
    snapshot: usize,
    action: Action,
    precondition: Option<OffsetDateTime>,
}

pub(super) fn build<S: RemoteStore, E: FactsEmitter, A: AuditSink>(
    mgr: &Manager<S, E, A>,
) -> SyncPlan {
    let mut entries: Vec<Entry> = Vec::new();
    for (snap_idx, snap) in mgr.snapshots.iter().enumerate() {
        for q in snap.queued() {
            entries.push(Entry {
                seq: q.seq,
                snapshot: snap_idx,
                action: q.action.clone(),
                precondition: q.precondition,
            });
        }
    }
    entries.sort_by_key(|e| e.seq);

    let depths: Vec<HashMap<ItemId, usize>> =
        mgr.snapshots.iter().map(|s| s.depths()).collect();
    normalize_deletion_runs(&mut entries, &depths);

    let actions: Vec<Action> = entries.iter().map(|e| e.action.clone()).collect();
    let pid = plan_id(&actions);
    let operations: Vec<PlanOperation> = entries
        .into_iter()
        .enumerate()
        .map(|(idx, e)| PlanOperation {
            op_id: op_id(&pid, &e.action, idx),
            index: idx,
            action: e.action,
            precondition: e.precondition,
        })
        .collect();

    let tctx = AuditCtx::new(
        &mgr.facts as &dyn FactsEmitter,
        pid.to_string(),
        crate::logging::now_iso(),
    );
    let slog = StageLogger::new(&tctx);
    for op in &operations {
        slog.plan()
            .op(op.op_id.to_string(), op.index)
            .field("kind", json!(op.action.kind().to_string()))
            .field("detail", json!(op.action.describe()))
            .emit_success();
    }

    SyncPlan {
        plan_id: pid,
        created_at: OffsetDateTime::now_utc(),
        operations,
    }
}

/// Re-sort each maximal contiguous run of deletion actions by hierarchy
/// depth descending, stable on the original order. Positions of
/// non-deletion actions are untouched. A run keeps its original order when
/// any of its targets has no known depth.
fn normalize_deletion_runs(entries: &mut Vec<Entry>, depths: &[HashMap<ItemId, usize>]) {
    let mut i = 0;
    while i < entries.len() {
        if !entries[i].action.is_delete() {
            i += 1;
            continue;
        }
        let mut j = i;
        while j < entries.len() && entries[j].action.is_delete() {
            j += 1;
        }
        if let Some(mut keyed) = deletion_sort_keys(&entries[i..j], depths) {
            // Stable sort; ties keep queue order via the seq component.
            keyed.sort_by_key(|(key, _)| *key);
            for (slot, (_, entry)) in keyed.into_iter().enumerate() {
                entries[i + slot] = entry;
            }
        }
        i = j;
    }
}

type RunKey = (Reverse<usize>, u64);

fn deletion_sort_keys(
    run: &[Entry],
    depths: &[HashMap<ItemId, usize>],
) -> Option<Vec<(RunKey, Entry)>> {
    let mut keyed = Vec::with_capacity(run.len());
    for e in run {
        let target = e.action.target()?;
        let depth = depths.get(e.snapshot)?.get(target)?;
        keyed.push(((Reverse(*depth), e.seq), e.clone()));
    }
    Some(keyed)
}
