//! Metadata snapshot of one remote item.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::constants::{EXPORT_ONLY_MIME_PREFIX, FOLDER_MIME};

use super::ids::ItemId;

/// Immutable snapshot of remote item metadata at read time.
///
/// `parents` is a list so that multi-parent items coming from the store can
/// be represented and then *rejected* where the contract requires a single
/// parent; the crate never creates multi-parent items itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: ItemId,
    pub name: String,
    pub mime_type: String,
    pub parents: Vec<ItemId>,
    #[serde(default)]
    pub trashed: bool,
    /// Per-item version marker assigned by the store; compared by equality
    /// only, never interpreted as wall-clock time.
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub modified_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl FileInfo {
    /// New folder metadata rooted under `parent`.
    pub fn folder(id: ItemId, name: impl Into<String>, parent: Option<ItemId>) -> Self {
        Self {
            id,
            name: name.into(),
            mime_type: FOLDER_MIME.to_string(),
            parents: parent.into_iter().collect(),
            trashed: false,
            modified_time: None,
            size: None,
        }
    }

    /// New file metadata rooted under `parent`.
    pub fn file(
        id: ItemId,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        parent: ItemId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            mime_type: mime_type.into(),
            parents: vec![parent],
            trashed: false,
            modified_time: None,
            size: None,
        }
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    /// Whether this item has a direct binary representation that can be
    /// downloaded. Folders and store-native document types do not.
    #[must_use]
    pub fn has_binary_content(&self) -> bool {
        !self.mime_type.starts_with(EXPORT_ONLY_MIME_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_and_export_only_items_have_no_binary_content() {
        let folder = FileInfo::folder(ItemId::remote("f"), "docs", None);
        assert!(folder.is_folder());
        assert!(!folder.has_binary_content());

        let doc = FileInfo::file(
            ItemId::remote("d"),
            "notes",
            "application/vnd.google-apps.document",
            ItemId::remote("f"),
        );
        assert!(!doc.has_binary_content());

        let pdf = FileInfo::file(
            ItemId::remote("p"),
            "scan.pdf",
            "application/pdf",
            ItemId::remote("f"),
        );
        assert!(pdf.has_binary_content());
    }
}
