//! Item identifiers and deterministic plan/operation IDs.
//!
//! `ItemId` keeps store-assigned ids and not-yet-real placeholders as
//! distinct variants so the two can never be confused. Plan and operation
//! ids are deterministic UUIDv5 values derived from a stable tag (`NS_TAG`)
//! and the serialized action sequence, so identical plans get identical ids
//! across runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::constants::NS_TAG;

use super::plan::Action;

/// Identifier of an item in the virtual view.
///
/// `Remote` ids come from the store; `Pending` ids are local placeholders
/// for items queued for creation that the store has not assigned an id yet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemId {
    Remote(String),
    Pending(Uuid),
}

impl ItemId {
    pub fn remote(id: impl Into<String>) -> Self {
        ItemId::Remote(id.into())
    }

    /// Fresh placeholder for an item that does not exist on the store yet.
    #[must_use]
    pub fn fresh_pending() -> Self {
        ItemId::Pending(Uuid::new_v4())
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, ItemId::Pending(_))
    }

    /// The store-assigned id, if this item already exists remotely.
    #[must_use]
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            ItemId::Remote(id) => Some(id),
            ItemId::Pending(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Remote(id) => write!(f, "{id}"),
            ItemId::Pending(u) => write!(f, "pending:{u}"),
        }
    }
}

fn namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, NS_TAG.as_bytes())
}

/// Serialize an action into a stable, human-readable string used for UUIDv5 input.
fn serialize_action(a: &Action) -> String {
    match a {
        Action::CreateFolder {
            name,
            parent,
            new_id,
        } => format!("CF:{parent}/{name}={new_id}"),
        Action::Rename { target, new_name } => format!("RN:{target}->{new_name}"),
        Action::Move {
            target,
            new_parent,
            old_parent,
        } => format!("MV:{target}:{old_parent}->{new_parent}"),
        Action::Copy {
            source,
            new_parent,
            new_id,
        } => format!("CP:{source}->{new_parent}={new_id}"),
        Action::Trash { target } => format!("TR:{target}"),
        Action::DeletePermanent { target } => format!("DL:{target}"),
        Action::Upload {
            local_path,
            parent,
            new_id,
        } => format!("UP:{}->{parent}={new_id}", local_path.display()),
        Action::Download {
            target,
            local_path,
            overwrite,
        } => format!("DN:{target}->{}:{overwrite}", local_path.display()),
    }
}

/// Compute a deterministic UUIDv5 for a plan from its ordered actions.
#[must_use]
pub fn plan_id(actions: &[Action]) -> Uuid {
    let ns = namespace();
    let mut s = String::new();
    for a in actions {
        s.push_str(&serialize_action(a));
        s.push('\n');
    }
    Uuid::new_v5(&ns, s.as_bytes())
}

/// Compute a deterministic UUIDv5 for one operation as a function of the
/// plan id, the serialized action, and its position.
#[must_use]
pub fn op_id(plan_id: &Uuid, action: &Action, idx: usize) -> Uuid {
    let mut s = serialize_action(action);
    let _ = write!(s, "#{idx}");
    Uuid::new_v5(plan_id, s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(target: &str, name: &str) -> Action {
        Action::Rename {
            target: ItemId::remote(target),
            new_name: name.to_string(),
        }
    }

    #[test]
    fn plan_id_is_deterministic_and_order_sensitive() {
        let a = rename("x", "one");
        let b = rename("y", "two");
        let p1 = plan_id(&[a.clone(), b.clone()]);
        let p2 = plan_id(&[a.clone(), b.clone()]);
        let p3 = plan_id(&[b, a]);
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
    }

    #[test]
    fn op_ids_differ_by_position() {
        let a = rename("x", "one");
        let pid = plan_id(&[a.clone(), a.clone()]);
        assert_ne!(op_id(&pid, &a, 0), op_id(&pid, &a, 1));
    }

    #[test]
    fn pending_ids_are_unique_and_tagged() {
        let p = ItemId::fresh_pending();
        let q = ItemId::fresh_pending();
        assert_ne!(p, q);
        assert!(p.is_pending());
        assert!(p.as_remote().is_none());
        assert_eq!(ItemId::remote("abc").as_remote(), Some("abc"));
    }
}
