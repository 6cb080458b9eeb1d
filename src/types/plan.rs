//! Actions, plan operations, and the immutable `SyncPlan`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use time::OffsetDateTime;
use uuid::Uuid;

use super::ids::ItemId;

/// One requested mutation against the remote store.
///
/// Created by a snapshot mutation call and never mutated afterwards. Ids for
/// not-yet-created items (`new_id`) are [`ItemId::Pending`] placeholders
/// resolved at apply time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    CreateFolder {
        name: String,
        parent: ItemId,
        new_id: ItemId,
    },
    Rename {
        target: ItemId,
        new_name: String,
    },
    Move {
        target: ItemId,
        new_parent: ItemId,
        old_parent: ItemId,
    },
    Copy {
        source: ItemId,
        new_parent: ItemId,
        new_id: ItemId,
    },
    Trash {
        target: ItemId,
    },
    DeletePermanent {
        target: ItemId,
    },
    Upload {
        local_path: PathBuf,
        parent: ItemId,
        new_id: ItemId,
    },
    Download {
        target: ItemId,
        local_path: PathBuf,
        overwrite: bool,
    },
}

impl Action {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::CreateFolder { .. } => ActionKind::CreateFolder,
            Action::Rename { .. } => ActionKind::Rename,
            Action::Move { .. } => ActionKind::Move,
            Action::Copy { .. } => ActionKind::Copy,
            Action::Trash { .. } => ActionKind::Trash,
            Action::DeletePermanent { .. } => ActionKind::DeletePermanent,
            Action::Upload { .. } => ActionKind::Upload,
            Action::Download { .. } => ActionKind::Download,
        }
    }

    /// The affected existing item, when the action targets one.
    #[must_use]
    pub const fn target(&self) -> Option<&ItemId> {
        match self {
            Action::Rename { target, .. }
            | Action::Move { target, .. }
            | Action::Trash { target }
            | Action::DeletePermanent { target }
            | Action::Download { target, .. } => Some(target),
            Action::Copy { source, .. } => Some(source),
            Action::CreateFolder { .. } | Action::Upload { .. } => None,
        }
    }

    /// Placeholder id this action will resolve to a real id when applied.
    #[must_use]
    pub const fn produces(&self) -> Option<&ItemId> {
        match self {
            Action::CreateFolder { new_id, .. }
            | Action::Copy { new_id, .. }
            | Action::Upload { new_id, .. } => Some(new_id),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_delete(&self) -> bool {
        matches!(self, Action::Trash { .. } | Action::DeletePermanent { .. })
    }

    /// One-line payload summary for plan review listings.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Action::CreateFolder { name, parent, .. } => format!("{name:?} under {parent}"),
            Action::Rename { target, new_name } => format!("{target} -> {new_name:?}"),
            Action::Move {
                target,
                new_parent,
                old_parent,
            } => format!("{target} from {old_parent} to {new_parent}"),
            Action::Copy {
                source, new_parent, ..
            } => format!("{source} into {new_parent}"),
            Action::Trash { target } | Action::DeletePermanent { target } => format!("{target}"),
            Action::Upload {
                local_path, parent, ..
            } => format!("{} into {parent}", local_path.display()),
            Action::Download {
                target, local_path, ..
            } => format!("{target} to {}", local_path.display()),
        }
    }
}

/// Action discriminant used in result rows and emitted facts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    CreateFolder,
    Rename,
    Move,
    Copy,
    Trash,
    DeletePermanent,
    Upload,
    Download,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::CreateFolder => "CREATE_FOLDER",
            ActionKind::Rename => "RENAME",
            ActionKind::Move => "MOVE",
            ActionKind::Copy => "COPY",
            ActionKind::Trash => "TRASH",
            ActionKind::DeletePermanent => "DELETE_PERMANENT",
            ActionKind::Upload => "UPLOAD_FILE",
            ActionKind::Download => "DOWNLOAD_FILE",
        };
        f.write_str(s)
    }
}

/// An action with its resolved execution order and precondition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanOperation {
    pub op_id: Uuid,
    /// Position in the plan's execution order.
    pub index: usize,
    pub action: Action,
    /// Version marker of the target observed when the action was queued.
    /// Checked against the live store before execution; absent for
    /// creation-kind actions.
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub precondition: Option<OffsetDateTime>,
}

/// Ordered, immutable sequence of operations ready for review and apply.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncPlan {
    pub plan_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub operations: Vec<PlanOperation>,
}

impl SyncPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Human-readable listing for the review-before-apply workflow.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("plan {} ({} operations)\n", self.plan_id, self.len());
        for op in &self.operations {
            out.push_str(&format!(
                "  {:>3}. {:<16} {}\n",
                op.index,
                op.action.kind().to_string(),
                op.action.describe()
            ));
        }
        out
    }
}
