//! Storage operations
//!
//! Enumerates the immediate children of the served root directory for the
//! LIST and FIND commands. Nothing is cached: every call reads the directory
//! afresh, and entries come back in whatever order the filesystem yields them.

use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// One immediate child of the served root, rendered as its full path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryEntry(PathBuf);

impl DirectoryEntry {
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// The path as it is written to the client.
    pub fn as_line(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

/// Lists every immediate child of `root`. Not recursive.
pub async fn list_directory(root: &Path) -> Result<Vec<DirectoryEntry>, StorageError> {
    let unreadable = |source| StorageError::DirectoryUnreadable {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(unreadable)?;
    let mut listing = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        listing.push(DirectoryEntry(entry.path()));
    }
    Ok(listing)
}

/// Lists the children of `root` whose full path contains `needle`.
///
/// Plain case-sensitive substring match; an empty needle matches everything.
pub async fn find_entries(root: &Path, needle: &str) -> Result<Vec<DirectoryEntry>, StorageError> {
    let mut listing = list_directory(root).await?;
    listing.retain(|entry| entry.as_line().contains(needle));
    Ok(listing)
}
