//! Boundary trait for the real remote store.

use std::path::Path;

use crate::types::{FileInfo, Result};

/// The remote hierarchical file store the apply engine executes against.
///
/// Implementations own transport concerns: pagination, timeouts, and retry
/// of transient failures before surfacing an error. Errors are reported as
/// [`crate::types::Error`] with the kind carrying the fatal/recoverable
/// classification.
///
/// All ids crossing this boundary are store-assigned string ids; placeholder
/// resolution happens above it.
pub trait RemoteStore {
    /// # Errors
    /// `NotFound` when no item with `id` exists.
    fn get_item(&self, id: &str) -> Result<FileInfo>;

    /// Direct (non-trashed and trashed) children of a folder.
    fn list_children(&self, folder_id: &str) -> Result<Vec<FileInfo>>;

    /// Returns the id assigned to the new folder.
    fn create_folder(&mut self, name: &str, parent_id: &str) -> Result<String>;

    fn rename(&mut self, id: &str, new_name: &str) -> Result<()>;

    fn move_item(&mut self, id: &str, new_parent_id: &str, old_parent_id: &str) -> Result<()>;

    /// Returns the id assigned to the copy.
    fn copy(&mut self, file_id: &str, new_parent_id: &str) -> Result<String>;

    fn trash(&mut self, id: &str) -> Result<()>;

    fn delete_permanent(&mut self, id: &str) -> Result<()>;

    /// Returns the id assigned to the uploaded file.
    fn upload(&mut self, local_path: &Path, parent_id: &str) -> Result<String>;

    fn download(&self, id: &str, local_path: &Path) -> Result<()>;
}
