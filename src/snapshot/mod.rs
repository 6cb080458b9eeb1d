//! Virtual local state: a cached view of a remote subtree plus the queue of
//! pending actions recorded against it.

pub mod view;

mod validate;

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;

use crate::constants::UPLOAD_MIME;
use crate::types::{Action, Error, FileInfo, ItemId, Result};

use view::TreeView;

/// One queued mutation with its global call order and captured precondition.
#[derive(Clone, Debug)]
pub(crate) struct QueuedAction {
    /// Global sequence stamped at queue time; plan building orders by this
    /// across all open snapshots.
    pub seq: u64,
    pub action: Action,
    pub precondition: Option<OffsetDateTime>,
}

/// A queued, not-yet-applied virtual view of a remote subtree.
///
/// Mutation calls validate against the cached view, append an [`Action`] to
/// the queue, and update the view optimistically so later calls in the same
/// snapshot observe the intended state. Nothing here touches the store.
///
/// Not safe for concurrent mutation; the model is single-writer per
/// snapshot.
pub struct Snapshot {
    root: ItemId,
    base: TreeView,
    view: TreeView,
    queue: Vec<QueuedAction>,
    tombstoned: HashSet<ItemId>,
    seq: Arc<AtomicU64>,
}

impl Snapshot {
    pub(crate) fn new(root: ItemId, view: TreeView, seq: Arc<AtomicU64>) -> Self {
        Self {
            root,
            base: view.clone(),
            view,
            queue: Vec::new(),
            tombstoned: HashSet::new(),
            seq,
        }
    }

    #[must_use]
    pub fn root(&self) -> &ItemId {
        &self.root
    }

    #[must_use]
    pub fn pending_ops(&self) -> usize {
        self.queue.len()
    }

    /// Drop all pending actions and reset the view to the state loaded from
    /// the store.
    pub fn clear_ops(&mut self) {
        self.queue.clear();
        self.tombstoned.clear();
        self.view = self.base.clone();
    }

    pub(crate) fn reset(&mut self, view: TreeView) {
        self.base = view.clone();
        self.view = view;
        self.queue.clear();
        self.tombstoned.clear();
    }

    pub(crate) fn queued(&self) -> &[QueuedAction] {
        &self.queue
    }

    /// Hierarchy depths of the current virtual view, for deletion ordering.
    pub(crate) fn depths(&self) -> HashMap<ItemId, usize> {
        self.view.depths_from(&self.root)
    }

    // ----------------------------
    // Read APIs (virtual view)
    // ----------------------------

    pub fn get(&self, id: &ItemId) -> Result<&FileInfo> {
        validate::exists(&self.view, id, "Item")
    }

    /// Children of `parent` in the virtual view, sorted by name then id.
    pub fn list_children(&self, parent: &ItemId) -> Result<Vec<&FileInfo>> {
        validate::is_folder(&self.view, parent, "Parent")?;
        let mut infos: Vec<&FileInfo> = self
            .view
            .child_ids(parent)
            .iter()
            .filter_map(|id| self.view.get(id))
            .collect();
        infos.sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));
        Ok(infos)
    }

    /// Items named `name`, under `parent` when given, otherwise anywhere in
    /// the subtree reachable from the root.
    pub fn find_by_name(&self, name: &str, parent: Option<&ItemId>) -> Result<Vec<&FileInfo>> {
        let mut matches: Vec<&FileInfo> = match parent {
            Some(parent) => {
                validate::exists(&self.view, parent, "Parent")?;
                self.view
                    .ids_by_name(parent, name)
                    .iter()
                    .filter_map(|id| self.view.get(id))
                    .collect()
            }
            None => {
                let mut found = Vec::new();
                let mut visited: HashSet<ItemId> = HashSet::new();
                let mut q: VecDeque<ItemId> = VecDeque::from([self.root.clone()]);
                while let Some(cur) = q.pop_front() {
                    if !visited.insert(cur.clone()) {
                        continue;
                    }
                    if let Some(info) = self.view.get(&cur) {
                        if info.name == name {
                            found.push(info);
                        }
                    }
                    for child in self.view.child_ids(&cur) {
                        if !visited.contains(&child) {
                            q.push_back(child);
                        }
                    }
                }
                found
            }
        };
        matches.sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));
        Ok(matches)
    }

    // ----------------------------
    // Mutation APIs (queue + optimistic view)
    // ----------------------------

    /// Queue a folder creation. Returns the placeholder id immediately so
    /// later calls can nest under it before any apply.
    pub fn create_folder(&mut self, name: &str, parent: &ItemId) -> Result<ItemId> {
        validate::is_folder(&self.view, parent, "Parent")?;
        validate::not_tombstoned(&self.tombstoned, parent, "Parent")?;

        let new_id = ItemId::fresh_pending();
        self.view
            .insert(FileInfo::folder(new_id.clone(), name, Some(parent.clone())));
        self.push(
            Action::CreateFolder {
                name: name.to_string(),
                parent: parent.clone(),
                new_id: new_id.clone(),
            },
            None,
        );
        Ok(new_id)
    }

    pub fn rename(&mut self, target: &ItemId, new_name: &str) -> Result<()> {
        validate::exists(&self.view, target, "Target")?;
        validate::not_root(&self.root, target, "rename")?;
        validate::not_tombstoned(&self.tombstoned, target, "Target")?;

        let precondition = self.capture_precondition(target);
        self.view.rename(target, new_name);
        self.push(
            Action::Rename {
                target: target.clone(),
                new_name: new_name.to_string(),
            },
            precondition,
        );
        Ok(())
    }

    /// Queue a move. The old parent is taken from the cached view; items
    /// with more than one parent are rejected.
    pub fn move_item(&mut self, target: &ItemId, new_parent: &ItemId) -> Result<()> {
        validate::exists(&self.view, target, "Target")?;
        validate::is_folder(&self.view, new_parent, "New parent")?;
        validate::not_root(&self.root, target, "move")?;
        validate::not_tombstoned(&self.tombstoned, target, "Target")?;
        validate::not_tombstoned(&self.tombstoned, new_parent, "New parent")?;
        let old_parent = validate::single_parent(&self.view, target)?;
        validate::move_no_cycle(&self.view, target, new_parent)?;

        let precondition = self.capture_precondition(target);
        self.view.replace_parent(target, new_parent);
        self.push(
            Action::Move {
                target: target.clone(),
                new_parent: new_parent.clone(),
                old_parent,
            },
            precondition,
        );
        Ok(())
    }

    /// Queue a file copy. Folder copies are unsupported and rejected.
    pub fn copy(&mut self, source: &ItemId, new_parent: &ItemId) -> Result<ItemId> {
        validate::is_folder(&self.view, new_parent, "New parent")?;
        validate::not_tombstoned(&self.tombstoned, source, "Source")?;
        validate::not_tombstoned(&self.tombstoned, new_parent, "New parent")?;
        validate::copyable(&self.view, source)?;

        let precondition = self.capture_precondition(source);
        let src = self.view.get(source).cloned().ok_or_else(|| {
            Error::invalid_state(format!("Source is unknown to this snapshot: {source}"))
        })?;
        let new_id = ItemId::fresh_pending();
        self.view.insert(FileInfo::file(
            new_id.clone(),
            src.name,
            src.mime_type,
            new_parent.clone(),
        ));
        self.push(
            Action::Copy {
                source: source.clone(),
                new_parent: new_parent.clone(),
                new_id: new_id.clone(),
            },
            precondition,
        );
        Ok(new_id)
    }

    pub fn trash(&mut self, target: &ItemId) -> Result<()> {
        self.queue_removal(target, "trash", true)
    }

    pub fn delete_permanent(&mut self, target: &ItemId) -> Result<()> {
        self.queue_removal(target, "delete", false)
    }

    /// Queue an upload of a local file into `parent`. The file itself is
    /// read only at apply time.
    pub fn upload(&mut self, local_path: &Path, parent: &ItemId) -> Result<ItemId> {
        validate::is_folder(&self.view, parent, "Parent")?;
        validate::not_tombstoned(&self.tombstoned, parent, "Parent")?;

        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_argument("upload path has no file name"))?;
        let new_id = ItemId::fresh_pending();
        self.view.insert(FileInfo::file(
            new_id.clone(),
            name,
            UPLOAD_MIME,
            parent.clone(),
        ));
        self.push(
            Action::Upload {
                local_path: local_path.to_path_buf(),
                parent: parent.clone(),
                new_id: new_id.clone(),
            },
            None,
        );
        Ok(new_id)
    }

    /// Queue a download of `target` to a local path. Items without a direct
    /// binary representation are rejected.
    pub fn download(&mut self, target: &ItemId, local_path: &Path, overwrite: bool) -> Result<()> {
        validate::not_tombstoned(&self.tombstoned, target, "Target")?;
        validate::downloadable(&self.view, target)?;

        let precondition = self.capture_precondition(target);
        self.push(
            Action::Download {
                target: target.clone(),
                local_path: local_path.to_path_buf(),
                overwrite,
            },
            precondition,
        );
        Ok(())
    }

    // ----------------------------
    // Internals
    // ----------------------------

    fn queue_removal(&mut self, target: &ItemId, verb: &str, trash: bool) -> Result<()> {
        validate::exists(&self.view, target, "Target")?;
        validate::not_root(&self.root, target, verb)?;
        validate::not_tombstoned(&self.tombstoned, target, "Target")?;

        let precondition = self.capture_precondition(target);
        self.tombstoned.insert(target.clone());
        self.view.set_trashed(target);
        let action = if trash {
            Action::Trash {
                target: target.clone(),
            }
        } else {
            Action::DeletePermanent {
                target: target.clone(),
            }
        };
        self.push(action, precondition);
        Ok(())
    }

    fn capture_precondition(&self, target: &ItemId) -> Option<OffsetDateTime> {
        self.view.get(target).and_then(|info| info.modified_time)
    }

    fn push(&mut self, action: Action, precondition: Option<OffsetDateTime>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.queue.push(QueuedAction {
            seq,
            action,
            precondition,
        });
    }
}
