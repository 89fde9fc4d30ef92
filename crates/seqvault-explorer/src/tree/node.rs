//! File tree nodes and their construction from listings.

use jiff::Timestamp;
use seqvault_core::{AggregatedListing, DEFAULT_DELIMITER, ObjectEntry, PrefixEntry};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Name of the synthetic root node.
pub const ROOT_NAME: &str = "All Files";

/// Whether a node is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of the file tree.
///
/// `path` is the full object key for files and the full prefix (ending with
/// the delimiter) for directories. `children` stays `None` until the
/// directory has been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTreeNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
    #[serde(default)]
    pub is_loading: bool,
}

impl FileTreeNode {
    /// Creates the synthetic root directory for `prefix`.
    pub fn root(prefix: impl Into<String>) -> Self {
        Self::directory(ROOT_NAME, prefix)
    }

    /// Creates an unloaded directory node.
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Directory,
            name: name.into(),
            path: path.into(),
            size: None,
            last_modified: None,
            children: None,
            is_loading: false,
        }
    }

    /// Creates a file node from a stored object.
    pub fn file(entry: ObjectEntry) -> Self {
        Self {
            kind: NodeKind::File,
            name: last_segment(&entry.key).to_owned(),
            size: entry.size,
            last_modified: entry.last_modified,
            path: entry.key,
            children: None,
            is_loading: false,
        }
    }

    /// Creates a directory node from a common prefix.
    pub fn from_prefix(entry: PrefixEntry) -> Self {
        let name = last_segment(&entry.prefix).to_owned();
        Self::directory(name, entry.prefix)
    }

    /// Returns `true` for directories.
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Returns `true` once the children have been attached.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// Returns the loaded children, or an empty slice.
    pub fn children(&self) -> &[FileTreeNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Iterates over the child directories.
    pub fn child_directories(&self) -> impl Iterator<Item = &FileTreeNode> {
        self.children().iter().filter(|node| node.is_directory())
    }
}

/// Returns the last non-empty path segment.
fn last_segment(path: &str) -> &str {
    path.trim_end_matches(DEFAULT_DELIMITER)
        .rsplit(DEFAULT_DELIMITER)
        .next()
        .unwrap_or(path)
}

/// Turns one listing of `prefix` into child nodes.
///
/// Folder placeholder objects (keys ending with the delimiter) and the
/// prefix itself are dropped. Directories come before files; within each
/// group the listing order is kept.
pub fn children_from_listing(listing: AggregatedListing, prefix: &str) -> Vec<FileTreeNode> {
    let AggregatedListing {
        contents,
        common_prefixes,
        ..
    } = listing;

    let directories = common_prefixes.into_iter().map(FileTreeNode::from_prefix);
    let files = contents
        .into_iter()
        .filter(|entry| !entry.key.ends_with(DEFAULT_DELIMITER) && entry.key != prefix)
        .map(FileTreeNode::file);

    directories.chain(files).collect()
}
