//! Indexed in-memory view of a remote subtree.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{FileInfo, ItemId};

/// Cached view of remote items within one root scope, with indexes kept
/// consistent through optimistic mutation.
#[derive(Clone, Debug, Default)]
pub struct TreeView {
    files: HashMap<ItemId, FileInfo>,
    children: HashMap<ItemId, HashSet<ItemId>>,
    names: HashMap<ItemId, HashMap<String, Vec<ItemId>>>,
}

impl TreeView {
    #[must_use]
    pub fn from_file_infos(files: Vec<FileInfo>) -> Self {
        let mut view = Self::default();
        for info in files {
            view.insert(info);
        }
        view
    }

    #[must_use]
    pub fn has(&self, id: &ItemId) -> bool {
        self.files.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&FileInfo> {
        self.files.get(id)
    }

    #[must_use]
    pub fn child_ids(&self, parent: &ItemId) -> Vec<ItemId> {
        self.children
            .get(parent)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids under `parent` carrying `name`. Name uniqueness is not enforced
    /// by the store, so this can return more than one id.
    #[must_use]
    pub fn ids_by_name(&self, parent: &ItemId, name: &str) -> Vec<ItemId> {
        self.names
            .get(parent)
            .and_then(|m| m.get(name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn insert(&mut self, info: FileInfo) {
        self.children.entry(info.id.clone()).or_default();
        self.names.entry(info.id.clone()).or_default();
        for parent in info.parents.clone() {
            self.link(&parent, &info.name, &info.id);
        }
        self.files.insert(info.id.clone(), info);
    }

    pub fn remove(&mut self, id: &ItemId) {
        let Some(info) = self.files.remove(id) else {
            return;
        };
        for parent in &info.parents {
            self.unlink(parent, &info.name, id);
        }
        // Descendants become unreachable but stay resident; deletions are
        // queued per item, so they get removed by their own operations.
        self.children.remove(id);
        self.names.remove(id);
    }

    pub fn rename(&mut self, id: &ItemId, new_name: &str) {
        let Some(info) = self.files.get(id) else {
            return;
        };
        if info.name == new_name {
            return;
        }
        let old_name = info.name.clone();
        let parents = info.parents.clone();
        for parent in &parents {
            self.unlink_name(parent, &old_name, id);
            self.link_name(parent, new_name, id);
        }
        if let Some(info) = self.files.get_mut(id) {
            info.name = new_name.to_string();
        }
    }

    /// Replace all parents with `new_parent` (move semantics).
    pub fn replace_parent(&mut self, id: &ItemId, new_parent: &ItemId) {
        let Some(info) = self.files.get(id) else {
            return;
        };
        let name = info.name.clone();
        let old_parents = info.parents.clone();
        for parent in &old_parents {
            self.unlink(parent, &name, id);
        }
        self.link(new_parent, &name, id);
        if let Some(info) = self.files.get_mut(id) {
            info.parents = vec![new_parent.clone()];
        }
    }

    pub fn set_trashed(&mut self, id: &ItemId) {
        if let Some(info) = self.files.get_mut(id) {
            info.trashed = true;
        }
    }

    /// Hop counts from `root` to every reachable item (BFS).
    #[must_use]
    pub fn depths_from(&self, root: &ItemId) -> HashMap<ItemId, usize> {
        let mut depth: HashMap<ItemId, usize> = HashMap::new();
        if !self.has(root) {
            return depth;
        }
        depth.insert(root.clone(), 0);
        let mut q: VecDeque<ItemId> = VecDeque::from([root.clone()]);
        while let Some(cur) = q.pop_front() {
            let d = depth[&cur];
            for child in self.child_ids(&cur) {
                if self.files.contains_key(&child) && !depth.contains_key(&child) {
                    depth.insert(child.clone(), d + 1);
                    q.push_back(child);
                }
            }
        }
        depth
    }

    fn link(&mut self, parent: &ItemId, name: &str, child: &ItemId) {
        self.children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        self.link_name(parent, name, child);
    }

    fn unlink(&mut self, parent: &ItemId, name: &str, child: &ItemId) {
        if let Some(set) = self.children.get_mut(parent) {
            set.remove(child);
        }
        self.unlink_name(parent, name, child);
    }

    fn link_name(&mut self, parent: &ItemId, name: &str, child: &ItemId) {
        let ids = self
            .names
            .entry(parent.clone())
            .or_default()
            .entry(name.to_string())
            .or_default();
        if !ids.contains(child) {
            ids.push(child.clone());
        }
    }

    fn unlink_name(&mut self, parent: &ItemId, name: &str, child: &ItemId) {
        let Some(name_map) = self.names.get_mut(parent) else {
            return;
        };
        if let Some(ids) = name_map.get_mut(name) {
            ids.retain(|c| c != child);
            if ids.is_empty() {
                name_map.remove(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileInfo;

    fn id(s: &str) -> ItemId {
        ItemId::remote(s)
    }

    fn sample() -> TreeView {
        TreeView::from_file_infos(vec![
            FileInfo::folder(id("root"), "root", None),
            FileInfo::folder(id("a"), "a", Some(id("root"))),
            FileInfo::file(id("f"), "notes.txt", "text/plain", id("a")),
        ])
    }

    #[test]
    fn indexes_follow_rename_and_move() {
        let mut view = sample();
        assert_eq!(view.ids_by_name(&id("a"), "notes.txt"), vec![id("f")]);

        view.rename(&id("f"), "todo.txt");
        assert!(view.ids_by_name(&id("a"), "notes.txt").is_empty());
        assert_eq!(view.ids_by_name(&id("a"), "todo.txt"), vec![id("f")]);

        view.replace_parent(&id("f"), &id("root"));
        assert!(view.ids_by_name(&id("a"), "todo.txt").is_empty());
        assert_eq!(view.ids_by_name(&id("root"), "todo.txt"), vec![id("f")]);
        assert_eq!(view.get(&id("f")).unwrap().parents, vec![id("root")]);
    }

    #[test]
    fn depths_count_ancestor_hops() {
        let view = sample();
        let depths = view.depths_from(&id("root"));
        assert_eq!(depths[&id("root")], 0);
        assert_eq!(depths[&id("a")], 1);
        assert_eq!(depths[&id("f")], 2);
    }

    #[test]
    fn remove_detaches_from_parent_indexes() {
        let mut view = sample();
        view.remove(&id("f"));
        assert!(!view.has(&id("f")));
        assert!(view.child_ids(&id("a")).is_empty());
        assert!(view.ids_by_name(&id("a"), "notes.txt").is_empty());
    }
}
