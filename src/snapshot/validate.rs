//! Strict structural validators for snapshot mutations.
//!
//! All checks run against the cached view only; none of them touch the
//! remote store. A failed check means no action is queued.

use std::collections::{HashSet, VecDeque};

use crate::types::{Error, FileInfo, ItemId, Result};

use super::view::TreeView;

pub(super) fn exists<'a>(view: &'a TreeView, id: &ItemId, what: &str) -> Result<&'a FileInfo> {
    view.get(id)
        .ok_or_else(|| Error::invalid_state(format!("{what} is unknown to this snapshot: {id}")))
}

pub(super) fn is_folder(view: &TreeView, id: &ItemId, what: &str) -> Result<()> {
    let info = exists(view, id, what)?;
    if !info.is_folder() {
        return Err(Error::invalid_argument(format!(
            "{what} must be a folder: {id}"
        )));
    }
    Ok(())
}

pub(super) fn not_root(root: &ItemId, target: &ItemId, action: &str) -> Result<()> {
    if target == root {
        return Err(Error::invalid_argument(format!(
            "root is protected: cannot {action} the snapshot root"
        )));
    }
    Ok(())
}

pub(super) fn not_tombstoned(
    tombstoned: &HashSet<ItemId>,
    target: &ItemId,
    what: &str,
) -> Result<()> {
    if tombstoned.contains(target) {
        return Err(Error::invalid_state(format!(
            "{what} is already scheduled for deletion: {target}"
        )));
    }
    Ok(())
}

/// MOVE requires the item to currently have exactly one parent.
pub(super) fn single_parent(view: &TreeView, target: &ItemId) -> Result<ItemId> {
    let info = exists(view, target, "Target")?;
    match info.parents.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(Error::invalid_state(format!(
            "target has no known parent: {target}"
        ))),
        _ => Err(Error::invalid_argument(format!(
            "move is not supported for multi-parent items: {target}"
        ))),
    }
}

/// Reject moves that would put `target` on its own ancestor chain. Walks
/// from `new_parent` towards the root following parents.
pub(super) fn move_no_cycle(view: &TreeView, target: &ItemId, new_parent: &ItemId) -> Result<()> {
    if target == new_parent {
        return Err(Error::invalid_argument(
            "move would create a cycle (target is the new parent)",
        ));
    }
    let mut q: VecDeque<ItemId> = VecDeque::from([new_parent.clone()]);
    let mut visited: HashSet<ItemId> = HashSet::new();
    while let Some(cur) = q.pop_front() {
        if !visited.insert(cur.clone()) {
            continue;
        }
        if &cur == target {
            return Err(Error::invalid_argument("move would create a cycle"));
        }
        // A parent outside the scope ends the climb on that branch.
        let Some(info) = view.get(&cur) else {
            continue;
        };
        for parent in &info.parents {
            if !visited.contains(parent) {
                q.push_back(parent.clone());
            }
        }
    }
    Ok(())
}

pub(super) fn copyable(view: &TreeView, source: &ItemId) -> Result<()> {
    let info = exists(view, source, "Source")?;
    if info.is_folder() {
        return Err(Error::invalid_argument(format!(
            "copying folders is not supported: {source}"
        )));
    }
    Ok(())
}

pub(super) fn downloadable(view: &TreeView, target: &ItemId) -> Result<()> {
    let info = exists(view, target, "Target")?;
    if !info.has_binary_content() {
        return Err(Error::invalid_argument(format!(
            "item has no direct binary representation: {target}"
        )));
    }
    Ok(())
}
