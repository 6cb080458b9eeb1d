//! Shared fixtures: a seeded in-memory store, a facts collector, and a
//! failure-injecting store wrapper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use drivestage::adapters::{MemoryStore, RemoteStore};
use drivestage::logging::FactsEmitter;
use drivestage::types::{Error, ErrorKind, FileInfo, ItemId, Result};

/// Captures every emitted fact for assertions.
#[derive(Default, Clone)]
pub struct TestEmitter {
    pub events: Arc<Mutex<Vec<(String, String, String, Value)>>>,
}

impl FactsEmitter for TestEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        self.events.lock().unwrap().push((
            subsystem.to_string(),
            event.to_string(),
            decision.to_string(),
            fields,
        ));
    }
}

impl TestEmitter {
    pub fn stages(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event, decision, _)| (event.clone(), decision.clone()))
            .collect()
    }

    pub fn facts_for(&self, event: &str) -> Vec<Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, e, _, _)| e == event)
            .map(|(_, _, _, f)| f.clone())
            .collect()
    }
}

pub fn rid(s: &str) -> ItemId {
    ItemId::remote(s)
}

/// Store layout used across the suite:
///
/// ```text
/// root/
///   readme.txt        (f1)
///   docs/             (d1)
///     a.txt           (f2)
///     drafts/         (d11)
///       deep.txt      (f3)
///   pics/             (d2)
/// ```
pub fn seeded_store() -> MemoryStore {
    let mut store = MemoryStore::with_root("root", "My Drive");
    store.add_file("f1", "readme.txt", "text/plain", "root", b"hello");
    store.add_folder("d1", "docs", "root");
    store.add_file("f2", "a.txt", "text/plain", "d1", b"alpha");
    store.add_folder("d11", "drafts", "d1");
    store.add_file("f3", "deep.txt", "text/plain", "d11", b"deep");
    store.add_folder("d2", "pics", "root");
    store
}

/// Wraps a [`MemoryStore`] and fails scripted (method, id) calls with a
/// chosen error kind; everything else is delegated.
pub struct FailingStore {
    pub inner: MemoryStore,
    fail: HashMap<(&'static str, String), ErrorKind>,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail: HashMap::new(),
        }
    }

    pub fn fail_on(&mut self, method: &'static str, id: &str, kind: ErrorKind) {
        self.fail.insert((method, id.to_string()), kind);
    }

    fn trip(&self, method: &'static str, id: &str) -> Result<()> {
        match self.fail.get(&(method, id.to_string())) {
            Some(kind) => Err(Error::new(*kind, format!("injected {method} failure"))),
            None => Ok(()),
        }
    }
}

impl RemoteStore for FailingStore {
    fn get_item(&self, id: &str) -> Result<FileInfo> {
        self.trip("get_item", id)?;
        self.inner.get_item(id)
    }

    fn list_children(&self, folder_id: &str) -> Result<Vec<FileInfo>> {
        self.trip("list_children", folder_id)?;
        self.inner.list_children(folder_id)
    }

    fn create_folder(&mut self, name: &str, parent_id: &str) -> Result<String> {
        self.trip("create_folder", parent_id)?;
        self.inner.create_folder(name, parent_id)
    }

    fn rename(&mut self, id: &str, new_name: &str) -> Result<()> {
        self.trip("rename", id)?;
        self.inner.rename(id, new_name)
    }

    fn move_item(&mut self, id: &str, new_parent_id: &str, old_parent_id: &str) -> Result<()> {
        self.trip("move_item", id)?;
        self.inner.move_item(id, new_parent_id, old_parent_id)
    }

    fn copy(&mut self, file_id: &str, new_parent_id: &str) -> Result<String> {
        self.trip("copy", file_id)?;
        self.inner.copy(file_id, new_parent_id)
    }

    fn trash(&mut self, id: &str) -> Result<()> {
        self.trip("trash", id)?;
        self.inner.trash(id)
    }

    fn delete_permanent(&mut self, id: &str) -> Result<()> {
        self.trip("delete_permanent", id)?;
        self.inner.delete_permanent(id)
    }

    fn upload(&mut self, local_path: &Path, parent_id: &str) -> Result<String> {
        self.trip("upload", parent_id)?;
        self.inner.upload(local_path, parent_id)
    }

    fn download(&self, id: &str, local_path: &Path) -> Result<()> {
        self.trip("download", id)?;
        self.inner.download(id, local_path)
    }
}
