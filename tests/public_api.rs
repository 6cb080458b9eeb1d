//! Surface-level behavior: emitted facts, plan rendering and serialization,
//! and manual refresh semantics.

mod common;

use common::{rid, seeded_store, FailingStore, TestEmitter};
use drivestage::logging::NullSink;
use drivestage::types::{ErrorKind, SyncPlan, SyncStatus};
use drivestage::Manager;

#[test]
fn plan_and_apply_emit_staged_facts_with_envelopes() {
    let facts = TestEmitter::default();
    let mut mgr = Manager::new(seeded_store(), facts.clone(), NullSink);
    let sid = mgr.open("root").unwrap();
    mgr.snapshot_mut(sid)
        .rename(&rid("f1"), "renamed.txt")
        .unwrap();

    let plan = mgr.build_plan();
    let result = mgr.apply_plan(plan.clone()).unwrap();
    assert_eq!(result.summary.applied, 1);

    assert_eq!(
        facts.stages(),
        vec![
            ("plan".to_string(), "success".to_string()),
            ("apply.attempt".to_string(), "success".to_string()),
            ("apply.result".to_string(), "success".to_string()),
            ("apply.summary".to_string(), "success".to_string()),
        ]
    );

    let results = facts.facts_for("apply.result");
    assert_eq!(results.len(), 1);
    let fields = &results[0];
    assert_eq!(fields["schema_version"], 1);
    assert_eq!(fields["plan_id"], plan.plan_id.to_string());
    assert_eq!(fields["op_id"], plan.operations[0].op_id.to_string());
    assert_eq!(fields["index"], 0);
    assert_eq!(fields["kind"], "RENAME");
    assert!(fields["ts"].is_string());
}

#[test]
fn failed_operations_emit_failure_facts_with_error_ids() {
    let facts = TestEmitter::default();
    let mut mgr = Manager::new(seeded_store(), facts.clone(), NullSink);
    let sid = mgr.open("root").unwrap();
    mgr.snapshot_mut(sid).rename(&rid("f1"), "x").unwrap();

    let plan = mgr.build_plan();
    mgr.store_mut().touch("f1");
    mgr.apply_plan(plan).unwrap();

    let results = facts.facts_for("apply.result");
    assert_eq!(results[0]["decision"], "failure");
    assert_eq!(results[0]["error_id"], "E_CONFLICT");

    let summary = facts.facts_for("apply.summary");
    assert_eq!(summary[0]["failed"], 1);
    assert_eq!(summary[0]["decision"], "failure");
}

#[test]
fn plans_render_for_review() {
    let mut mgr = Manager::new(seeded_store(), TestEmitter::default(), NullSink);
    let sid = mgr.open("root").unwrap();
    let snap = mgr.snapshot_mut(sid);
    snap.create_folder("tmp", &rid("root")).unwrap();
    snap.rename(&rid("f1"), "renamed.txt").unwrap();

    let rendered = mgr.build_plan().render();
    assert!(rendered.contains("2 operations"));
    assert!(rendered.contains("CREATE_FOLDER"));
    assert!(rendered.contains("RENAME"));
    assert!(rendered.contains("renamed.txt"));
}

#[test]
fn failed_refresh_degrades_to_a_warn_fact() {
    let facts = TestEmitter::default();
    let mut store = FailingStore::new(seeded_store());
    // "m0001" is the id the store will assign to the folder created below;
    // the post-apply reload trips over it while walking the subtree.
    store.fail_on("list_children", "m0001", ErrorKind::Network);

    let mut mgr = Manager::new(store, facts.clone(), NullSink);
    let sid = mgr.open("root").unwrap();
    mgr.snapshot_mut(sid)
        .create_folder("tmp", &rid("root"))
        .unwrap();

    let plan = mgr.build_plan();
    let result = mgr.apply_plan(plan).unwrap();
    assert_eq!(result.status, SyncStatus::Completed);
    assert_eq!(result.summary.applied, 1);
    assert!(!result.snapshot_refreshed);
    assert_eq!(mgr.snapshot(sid).pending_ops(), 0, "queue still cleared");

    let warns = facts.facts_for("refresh");
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0]["decision"], "warn");
    assert_eq!(warns[0]["error_id"], "E_NETWORK");
    assert_eq!(warns[0]["root"], "root");

    // The summary fact is still emitted after the refresh attempt.
    let summary = facts.facts_for("apply.summary");
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0]["snapshot_refreshed"], false);
}

#[test]
fn results_render_for_review() {
    let mut mgr = Manager::new(seeded_store(), TestEmitter::default(), NullSink);
    let sid = mgr.open("root").unwrap();
    let snap = mgr.snapshot_mut(sid);
    snap.rename(&rid("f1"), "renamed.txt").unwrap();
    snap.trash(&rid("f2")).unwrap();

    let plan = mgr.build_plan();
    mgr.store_mut().touch("f1");
    let result = mgr.apply_plan(plan).unwrap();

    let rendered = result.render();
    assert!(rendered.contains("1 applied, 1 failed, 0 skipped"));
    assert!(rendered.contains("RENAME"));
    assert!(rendered.contains("E_CONFLICT"));
    assert!(rendered.contains("TRASH"));
}

#[test]
fn plans_survive_a_serde_round_trip() {
    let mut mgr = Manager::new(seeded_store(), TestEmitter::default(), NullSink);
    let sid = mgr.open("root").unwrap();
    let snap = mgr.snapshot_mut(sid);
    snap.rename(&rid("f1"), "renamed.txt").unwrap();
    snap.trash(&rid("d2")).unwrap();

    let plan = mgr.build_plan();
    let encoded = serde_json::to_string(&plan).unwrap();
    let decoded: SyncPlan = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.plan_id, plan.plan_id);
    assert_eq!(decoded.operations, plan.operations);
}

#[test]
fn refresh_requires_an_empty_queue() {
    let mut mgr = Manager::new(seeded_store(), TestEmitter::default(), NullSink);
    let sid = mgr.open("root").unwrap();
    mgr.snapshot_mut(sid).rename(&rid("f1"), "x").unwrap();

    let err = mgr.refresh(sid).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    mgr.snapshot_mut(sid).clear_ops();
    mgr.refresh(sid).unwrap();
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn snapshot_handles_are_scoped_to_their_manager() {
    let mut first = Manager::new(seeded_store(), TestEmitter::default(), NullSink);
    let sid = first.open("root").unwrap();
    let other = Manager::new(seeded_store(), TestEmitter::default(), NullSink);
    let _ = other.snapshot(sid);
}

#[test]
fn open_tolerates_cyclic_parent_links() {
    let mut store = seeded_store();
    // A misbehaving store can report d11 as both child and parent of d1.
    store.add_parent("d1", "d11");
    let mut mgr = Manager::new(store, TestEmitter::default(), NullSink);
    let sid = mgr.open("root").unwrap();

    let found = mgr.snapshot(sid).find_by_name("deep.txt", None).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, rid("f3"));
}

#[test]
fn refresh_picks_up_out_of_band_changes() {
    let mut mgr = Manager::new(seeded_store(), TestEmitter::default(), NullSink);
    let sid = mgr.open("root").unwrap();
    assert!(mgr.snapshot(sid).find_by_name("late.txt", None).unwrap().is_empty());

    mgr.store_mut()
        .add_file("f9", "late.txt", "text/plain", "root", b"late");
    mgr.refresh(sid).unwrap();

    let found = mgr.snapshot(sid).find_by_name("late.txt", None).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, rid("f9"));
}
