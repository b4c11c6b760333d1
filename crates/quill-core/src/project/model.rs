//! Project snapshot and context payload models.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Detected project kind, decided by marker files in a fixed priority
/// order (first match wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectKind {
    Ruby,
    Node,
    Python,
    Java,
    Rust,
    Go,
    /// Version-controlled directory with no recognized language marker.
    GitRepo,
    /// Anything else.
    General,
}

/// Repository facts from the repository inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    /// Current branch name, when resolvable.
    pub branch: Option<String>,
    /// Whether the working tree has uncommitted changes.
    pub dirty: bool,
    /// URL of the `origin` remote, when configured.
    pub remote_url: Option<String>,
}

/// Shortlists of notable files found at the project root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileInventory {
    /// Files from the canonical important list that are present, in the
    /// canonical order.
    pub important: Vec<String>,
    /// First five config-like filenames.
    pub config: Vec<String>,
    /// First ten source-like filenames.
    pub source: Vec<String>,
}

/// Aggregate counts over the non-ignored file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeStats {
    pub file_count: u64,
    pub total_bytes: u64,
}

/// The complete snapshot of a scanned project directory.
///
/// Recomputed whole on refresh; never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Absolute path of the project root.
    pub path: PathBuf,
    /// Directory basename, used as the display name.
    pub name: String,
    /// Detected project kind.
    pub kind: ProjectKind,
    /// Notable file shortlists.
    pub files: FileInventory,
    /// File and byte counts excluding ignored paths.
    pub size: SizeStats,
    /// Repository metadata; `None` when not a repository.
    pub repository: Option<RepoMetadata>,
}

/// One node of a depth-bounded file tree.
///
/// Directories serialize as nested maps, files as their byte size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileTreeNode {
    /// File leaf: size in bytes.
    File(u64),
    /// Directory: children sorted lexicographically by name.
    Directory(BTreeMap<String, FileTreeNode>),
}

impl FileTreeNode {
    /// An empty directory node.
    pub fn empty_dir() -> Self {
        Self::Directory(BTreeMap::new())
    }
}

/// The bounded snapshot of project facts attached to a request.
///
/// Produced fresh per request; never cached across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPayload {
    /// Project display name.
    pub name: String,
    /// Detected project kind.
    pub kind: ProjectKind,
    /// Repository metadata, when the project is a repository.
    pub repository: Option<RepoMetadata>,
    /// ISO 8601 timestamp of when the payload was produced.
    pub generated_at: String,
    /// Relative path to file content for important files under the size
    /// cap; a per-file read failure appears as an inline error string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, String>>,
    /// Depth-bounded file tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<FileTreeNode>,
}

/// One hit from a project search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Path relative to the project root.
    pub path: String,
    /// Matched substrings (empty in filename-search mode).
    pub matches: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_kind_display_is_snake_case() {
        assert_eq!(ProjectKind::Ruby.to_string(), "ruby");
        assert_eq!(ProjectKind::GitRepo.to_string(), "git_repo");
    }

    #[test]
    fn test_file_tree_serializes_files_as_sizes() {
        let mut root = BTreeMap::new();
        root.insert("main.rb".to_string(), FileTreeNode::File(120));
        let mut lib = BTreeMap::new();
        lib.insert("util.rb".to_string(), FileTreeNode::File(40));
        root.insert("lib".to_string(), FileTreeNode::Directory(lib));

        let json = serde_json::to_value(FileTreeNode::Directory(root)).unwrap();

        assert_eq!(json["main.rb"], serde_json::json!(120));
        assert_eq!(json["lib"]["util.rb"], serde_json::json!(40));
    }
}
