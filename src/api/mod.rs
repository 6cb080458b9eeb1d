// Facade for the API module; stage implementations live in submodules.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::adapters::RemoteStore;
use crate::logging::{AuditSink, FactsEmitter};
use crate::snapshot::view::TreeView;
use crate::snapshot::Snapshot;
use crate::types::{Error, FileInfo, ItemId, Result, SyncPlan, SyncResult};

mod apply;
mod plan;

/// Handle to a snapshot owned by a [`Manager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotId(usize);

/// Owns the open snapshots and the remote store, and exposes the three
/// entry points of the plan/apply workflow: `open`, `build_plan`,
/// `apply_plan`.
///
/// Holds no remote-store logic itself; everything behind the
/// [`RemoteStore`] boundary belongs to the collaborator.
pub struct Manager<S: RemoteStore, E: FactsEmitter, A: AuditSink> {
    store: S,
    facts: E,
    audit: A,
    snapshots: Vec<Snapshot>,
    // Global call-order stamp shared by all snapshots; plan building orders
    // queued actions by it across snapshots.
    seq: Arc<AtomicU64>,
}

impl<S: RemoteStore, E: FactsEmitter, A: AuditSink> Manager<S, E, A> {
    pub fn new(store: S, facts: E, audit: A) -> Self {
        Self {
            store,
            facts,
            audit,
            snapshots: Vec::new(),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Load the subtree rooted at `root_id` from the store and open a
    /// snapshot over it. Trashed items are excluded from the view.
    ///
    /// # Errors
    /// `NotFound` when the root does not exist; `InvalidArgument` when it is
    /// not a folder.
    pub fn open(&mut self, root_id: &str) -> Result<SnapshotId> {
        let (root, view) = load_view(&self.store, root_id)?;
        self.snapshots
            .push(Snapshot::new(root, view, Arc::clone(&self.seq)));
        Ok(SnapshotId(self.snapshots.len() - 1))
    }

    /// # Panics
    /// Panics when `id` was not issued by this manager.
    pub fn snapshot(&self, id: SnapshotId) -> &Snapshot {
        &self.snapshots[id.0]
    }

    /// # Panics
    /// Panics when `id` was not issued by this manager.
    pub fn snapshot_mut(&mut self, id: SnapshotId) -> &mut Snapshot {
        &mut self.snapshots[id.0]
    }

    /// Reload a snapshot from the store, discarding the cached view.
    ///
    /// # Errors
    /// `InvalidState` while pending operations exist; apply or
    /// [`Snapshot::clear_ops`] first.
    pub fn refresh(&mut self, id: SnapshotId) -> Result<()> {
        if self.snapshots[id.0].pending_ops() > 0 {
            return Err(Error::invalid_state(
                "pending operations exist; apply or clear them before refreshing",
            ));
        }
        let root_id = self.snapshots[id.0].root().to_string();
        let (_, view) = load_view(&self.store, &root_id)?;
        self.snapshots[id.0].reset(view);
        Ok(())
    }

    /// Derive a reviewable plan from the queued actions of all open
    /// snapshots, in global call order. Queues are left intact; the same
    /// queues can be built into another plan later.
    pub fn build_plan(&self) -> SyncPlan {
        plan::build(self)
    }

    /// Execute a plan against the store. Consumes the plan; a plan is
    /// applied at most once.
    ///
    /// Fatal failures abort the remainder and surface as
    /// `SyncStatus::Aborted` on the returned result. `Err` is reserved for
    /// plans that are malformed before anything executes.
    pub fn apply_plan(&mut self, plan: SyncPlan) -> Result<SyncResult> {
        apply::run(self, plan)
    }
}

/// BFS over the subtree rooted at `root_id`, excluding trashed items. The
/// visited set keeps the walk terminating even when the store reports
/// multi-parent links or parent cycles within the scope.
fn load_view<S: RemoteStore>(store: &S, root_id: &str) -> Result<(ItemId, TreeView)> {
    let mut root = store.get_item(root_id)?;
    if !root.is_folder() {
        return Err(Error::invalid_argument(format!(
            "snapshot root must be a folder: {root_id}"
        )));
    }
    // Scope root: detach from any parents outside the scope.
    root.parents.clear();

    let mut infos: Vec<FileInfo> = vec![root];
    let mut visited: HashSet<String> = HashSet::from([root_id.to_string()]);
    let mut folders: VecDeque<String> = VecDeque::from([root_id.to_string()]);
    while let Some(folder_id) = folders.pop_front() {
        for child in store.list_children(&folder_id)? {
            if child.trashed {
                continue;
            }
            if child.is_folder() {
                if let Some(id) = child.id.as_remote() {
                    if visited.insert(id.to_string()) {
                        folders.push_back(id.to_string());
                    }
                }
            }
            infos.push(child);
        }
    }
    let root_id = infos[0].id.clone();
    Ok((root_id, TreeView::from_file_infos(infos)))
}
