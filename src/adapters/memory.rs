//! In-memory reference implementation of [`RemoteStore`].
//!
//! Backs the test suite and serves as a behavioral model of the store:
//! every successful mutation bumps the affected item's `modified_time`
//! marker monotonically, which is what the apply engine's conflict check
//! keys on.

use std::collections::HashMap;
use std::path::Path;
use time::{Duration, OffsetDateTime};

use crate::constants::FOLDER_MIME;
use crate::types::{Error, ErrorKind, FileInfo, ItemId, Result};

use super::store::RemoteStore;

#[derive(Clone, Debug)]
struct Entry {
    name: String,
    mime_type: String,
    parents: Vec<String>,
    trashed: bool,
    modified: OffsetDateTime,
    content: Option<Vec<u8>>,
}

/// Remote store held entirely in memory.
pub struct MemoryStore {
    items: HashMap<String, Entry>,
    root_id: String,
    next_id: u64,
    // Logical clock backing the modified_time markers.
    clock: i64,
}

impl MemoryStore {
    /// Store with a single root folder named `name` under id `root_id`.
    #[must_use]
    pub fn with_root(root_id: &str, name: &str) -> Self {
        let mut store = Self {
            items: HashMap::new(),
            root_id: root_id.to_string(),
            next_id: 1,
            clock: 0,
        };
        let ts = store.tick();
        store.items.insert(
            root_id.to_string(),
            Entry {
                name: name.to_string(),
                mime_type: FOLDER_MIME.to_string(),
                parents: Vec::new(),
                trashed: false,
                modified: ts,
                content: None,
            },
        );
        store
    }

    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Seed a folder without going through the mutation API.
    pub fn add_folder(&mut self, id: &str, name: &str, parent_id: &str) {
        let ts = self.tick();
        self.items.insert(
            id.to_string(),
            Entry {
                name: name.to_string(),
                mime_type: FOLDER_MIME.to_string(),
                parents: vec![parent_id.to_string()],
                trashed: false,
                modified: ts,
                content: None,
            },
        );
    }

    /// Seed a file without going through the mutation API.
    pub fn add_file(&mut self, id: &str, name: &str, mime_type: &str, parent_id: &str, content: &[u8]) {
        let ts = self.tick();
        self.items.insert(
            id.to_string(),
            Entry {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                parents: vec![parent_id.to_string()],
                trashed: false,
                modified: ts,
                content: Some(content.to_vec()),
            },
        );
    }

    /// Give an item an extra parent, for exercising multi-parent rejection.
    pub fn add_parent(&mut self, id: &str, parent_id: &str) {
        if let Some(entry) = self.items.get_mut(id) {
            entry.parents.push(parent_id.to_string());
        }
    }

    /// Simulate a concurrent out-of-band modification: bump the item's
    /// version marker without any other change.
    pub fn touch(&mut self, id: &str) {
        let ts = self.tick();
        if let Some(entry) = self.items.get_mut(id) {
            entry.modified = ts;
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    #[must_use]
    pub fn is_trashed(&self, id: &str) -> bool {
        self.items.get(id).is_some_and(|e| e.trashed)
    }

    #[must_use]
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.items.get(id).map(|e| e.name.as_str())
    }

    #[must_use]
    pub fn content_of(&self, id: &str) -> Option<&[u8]> {
        self.items.get(id).and_then(|e| e.content.as_deref())
    }

    fn tick(&mut self) -> OffsetDateTime {
        self.clock += 1;
        // Any strictly increasing marker works; seconds since a fixed epoch
        // keep test output readable.
        OffsetDateTime::from_unix_timestamp(1_700_000_000)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
            + Duration::seconds(self.clock)
    }

    fn fresh_id(&mut self) -> String {
        let id = format!("m{:04}", self.next_id);
        self.next_id += 1;
        id
    }

    fn entry(&self, id: &str) -> Result<&Entry> {
        self.items
            .get(id)
            .ok_or_else(|| Error::not_found(format!("no such item: {id}")))
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut Entry> {
        self.items
            .get_mut(id)
            .ok_or_else(|| Error::not_found(format!("no such item: {id}")))
    }

    fn require_folder(&self, id: &str) -> Result<()> {
        let entry = self.entry(id)?;
        if entry.mime_type != FOLDER_MIME {
            return Err(Error::invalid_argument(format!("not a folder: {id}")));
        }
        Ok(())
    }

    fn info(&self, id: &str, entry: &Entry) -> FileInfo {
        FileInfo {
            id: ItemId::remote(id),
            name: entry.name.clone(),
            mime_type: entry.mime_type.clone(),
            parents: entry.parents.iter().map(ItemId::remote).collect(),
            trashed: entry.trashed,
            modified_time: Some(entry.modified),
            size: entry.content.as_ref().map(|c| c.len() as u64),
        }
    }

    fn remove_subtree(&mut self, id: &str) {
        let children: Vec<String> = self
            .items
            .iter()
            .filter(|(_, e)| e.parents.iter().any(|p| p == id))
            .map(|(cid, _)| cid.clone())
            .collect();
        for child in children {
            self.remove_subtree(&child);
        }
        self.items.remove(id);
    }
}

impl RemoteStore for MemoryStore {
    fn get_item(&self, id: &str) -> Result<FileInfo> {
        let entry = self.entry(id)?;
        Ok(self.info(id, entry))
    }

    fn list_children(&self, folder_id: &str) -> Result<Vec<FileInfo>> {
        self.require_folder(folder_id)?;
        let mut out: Vec<FileInfo> = self
            .items
            .iter()
            .filter(|(_, e)| e.parents.iter().any(|p| p == folder_id))
            .map(|(id, e)| self.info(id, e))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    fn create_folder(&mut self, name: &str, parent_id: &str) -> Result<String> {
        self.require_folder(parent_id)?;
        let id = self.fresh_id();
        let ts = self.tick();
        self.items.insert(
            id.clone(),
            Entry {
                name: name.to_string(),
                mime_type: FOLDER_MIME.to_string(),
                parents: vec![parent_id.to_string()],
                trashed: false,
                modified: ts,
                content: None,
            },
        );
        Ok(id)
    }

    fn rename(&mut self, id: &str, new_name: &str) -> Result<()> {
        let ts = self.tick();
        let entry = self.entry_mut(id)?;
        entry.name = new_name.to_string();
        entry.modified = ts;
        Ok(())
    }

    fn move_item(&mut self, id: &str, new_parent_id: &str, old_parent_id: &str) -> Result<()> {
        self.require_folder(new_parent_id)?;
        let ts = self.tick();
        let entry = self.entry_mut(id)?;
        if !entry.parents.iter().any(|p| p == old_parent_id) {
            return Err(Error::invalid_argument(format!(
                "{old_parent_id} is not a parent of {id}"
            )));
        }
        entry.parents.retain(|p| p != old_parent_id);
        entry.parents.push(new_parent_id.to_string());
        entry.modified = ts;
        Ok(())
    }

    fn copy(&mut self, file_id: &str, new_parent_id: &str) -> Result<String> {
        self.require_folder(new_parent_id)?;
        let src = self.entry(file_id)?;
        if src.mime_type == FOLDER_MIME {
            return Err(Error::invalid_argument(format!(
                "cannot copy a folder: {file_id}"
            )));
        }
        let mut copy = src.clone();
        copy.parents = vec![new_parent_id.to_string()];
        let id = self.fresh_id();
        copy.modified = self.tick();
        self.items.insert(id.clone(), copy);
        Ok(id)
    }

    fn trash(&mut self, id: &str) -> Result<()> {
        let ts = self.tick();
        let entry = self.entry_mut(id)?;
        entry.trashed = true;
        entry.modified = ts;
        Ok(())
    }

    fn delete_permanent(&mut self, id: &str) -> Result<()> {
        self.entry(id)?;
        self.remove_subtree(id);
        Ok(())
    }

    fn upload(&mut self, local_path: &Path, parent_id: &str) -> Result<String> {
        self.require_folder(parent_id)?;
        let content = std::fs::read(local_path)
            .map_err(|e| Error::new(ErrorKind::Io, format!("read {}: {e}", local_path.display())))?;
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_argument("upload path has no file name"))?;
        let id = self.fresh_id();
        let ts = self.tick();
        self.items.insert(
            id.clone(),
            Entry {
                name,
                mime_type: "application/octet-stream".to_string(),
                parents: vec![parent_id.to_string()],
                trashed: false,
                modified: ts,
                content: Some(content),
            },
        );
        Ok(id)
    }

    fn download(&self, id: &str, local_path: &Path) -> Result<()> {
        let entry = self.entry(id)?;
        let content = entry
            .content
            .as_ref()
            .ok_or_else(|| Error::invalid_argument(format!("no binary content: {id}")))?;
        std::fs::write(local_path, content)
            .map_err(|e| Error::new(ErrorKind::Io, format!("write {}: {e}", local_path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_bump_the_version_marker() {
        let mut store = MemoryStore::with_root("root", "My Drive");
        store.add_file("f1", "a.txt", "text/plain", "root", b"hello");
        let before = store.get_item("f1").unwrap().modified_time.unwrap();
        store.rename("f1", "b.txt").unwrap();
        let after = store.get_item("f1").unwrap().modified_time.unwrap();
        assert!(after > before);
    }

    #[test]
    fn delete_removes_the_whole_subtree() {
        let mut store = MemoryStore::with_root("root", "My Drive");
        store.add_folder("d1", "docs", "root");
        store.add_file("f1", "a.txt", "text/plain", "d1", b"x");
        store.delete_permanent("d1").unwrap();
        assert!(!store.contains("d1"));
        assert!(!store.contains("f1"));
    }
}
