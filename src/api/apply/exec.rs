//! Per-operation execution: placeholder resolution, precondition check,
//! and dispatch to the remote store.

use std::collections::HashMap;
use uuid::Uuid;

use crate::adapters::RemoteStore;
use crate::types::{Action, Error, ErrorKind, ItemId, PlanOperation, Result};

/// Resolve an id to the store-assigned form. Placeholders must have been
/// produced by an earlier operation in the same plan.
pub(super) fn resolve(id: &ItemId, id_map: &HashMap<Uuid, String>) -> Result<String> {
    match id {
        ItemId::Remote(s) => Ok(s.clone()),
        ItemId::Pending(u) => id_map.get(u).cloned().ok_or_else(|| {
            Error::invalid_state(format!(
                "unresolved placeholder id {u}; producing operation did not run"
            ))
        }),
    }
}

fn record_produced(
    id_map: &mut HashMap<Uuid, String>,
    new_id: &ItemId,
    produced: String,
) -> Result<String> {
    match new_id {
        ItemId::Pending(u) => {
            id_map.insert(*u, produced.clone());
            Ok(produced)
        }
        ItemId::Remote(_) => Err(Error::invalid_state(
            "creation action carries a non-placeholder result id",
        )),
    }
}

/// Execute one operation. Returns the store-assigned id for creation-kind
/// actions. All failures come back as [`Error`]; the caller decides whether
/// the kind aborts the plan.
pub(super) fn execute<S: RemoteStore>(
    store: &mut S,
    op: &PlanOperation,
    id_map: &mut HashMap<Uuid, String>,
) -> Result<Option<String>> {
    if let Some(expected) = op.precondition {
        if let Some(target) = op.action.target() {
            check_precondition(store, target, expected, id_map)?;
        }
    }

    match &op.action {
        Action::CreateFolder {
            name,
            parent,
            new_id,
        } => {
            let parent = resolve(parent, id_map)?;
            let produced = store.create_folder(name, &parent)?;
            Ok(Some(record_produced(id_map, new_id, produced)?))
        }
        Action::Rename { target, new_name } => {
            let id = resolve(target, id_map)?;
            store.rename(&id, new_name)?;
            Ok(None)
        }
        Action::Move {
            target,
            new_parent,
            old_parent,
        } => {
            let id = resolve(target, id_map)?;
            let new_parent = resolve(new_parent, id_map)?;
            let old_parent = resolve(old_parent, id_map)?;
            store.move_item(&id, &new_parent, &old_parent)?;
            Ok(None)
        }
        Action::Copy {
            source,
            new_parent,
            new_id,
        } => {
            let source = resolve(source, id_map)?;
            let parent = resolve(new_parent, id_map)?;
            let produced = store.copy(&source, &parent)?;
            Ok(Some(record_produced(id_map, new_id, produced)?))
        }
        Action::Trash { target } => {
            let id = resolve(target, id_map)?;
            store.trash(&id)?;
            Ok(None)
        }
        Action::DeletePermanent { target } => {
            let id = resolve(target, id_map)?;
            store.delete_permanent(&id)?;
            Ok(None)
        }
        Action::Upload {
            local_path,
            parent,
            new_id,
        } => {
            let parent_id = resolve(parent, id_map)?;
            let produced = store.upload(local_path, &parent_id)?;
            Ok(Some(record_produced(id_map, new_id, produced)?))
        }
        Action::Download {
            target,
            local_path,
            overwrite,
        } => {
            if !overwrite && local_path.exists() {
                return Err(Error::new(
                    ErrorKind::Io,
                    format!("destination exists: {}", local_path.display()),
                ));
            }
            let id = resolve(target, id_map)?;
            store.download(&id, local_path)?;
            Ok(None)
        }
    }
}

/// Compare the live version marker against the one captured at queue time.
fn check_precondition<S: RemoteStore>(
    store: &S,
    target: &ItemId,
    expected: time::OffsetDateTime,
    id_map: &HashMap<Uuid, String>,
) -> Result<()> {
    let id = resolve(target, id_map)?;
    let live = store.get_item(&id)?;
    match live.modified_time {
        Some(actual) if actual == expected => Ok(()),
        Some(_) => Err(Error::conflict(format!(
            "item changed remotely since it was queued: {id}"
        ))),
        None => Err(Error::conflict(format!(
            "remote version marker unavailable: {id}"
        ))),
    }
}
