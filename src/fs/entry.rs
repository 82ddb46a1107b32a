//! Listing entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key;

/// A stored file as seen in a listing.
///
/// Derived and read-only: every listing replaces entries wholesale; nothing
/// mutates a `FileEntry` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Full object key (`{uuid}-{name}` convention).
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified timestamp reported by the store.
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    /// Human-readable name relative to a parent prefix.
    pub fn display_name(&self, parent: &str) -> String {
        key::display_name(&self.key, parent)
    }
}

/// A virtual folder as seen in a listing.
///
/// Purely a computed view over a key prefix; folders have no stored entity
/// beyond their marker object. Aggregates cover the whole subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Folder prefix, always ending in `/`.
    pub prefix: String,
    /// Display name: leaf segment, UUID convention stripped.
    pub name: String,
    /// Number of descendant files (markers excluded).
    pub file_count: usize,
    /// Sum of descendant file sizes in bytes.
    pub total_size: u64,
    /// Most recently modified descendant, if any.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Two-list view of a path: files directly under it, and one level of
/// sub-folders. Order is the store's response order; sorting is a
/// presentation concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Files directly under the listed path.
    pub files: Vec<FileEntry>,
    /// Immediate sub-folders with subtree aggregates.
    pub folders: Vec<FolderEntry>,
}

impl Listing {
    /// True if the path holds neither files nor folders.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }
}
