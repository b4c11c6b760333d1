//! Project context domain.
//!
//! Models for the project snapshot a scan produces, the derived context
//! payload attached to a request, and the repository-inspector seam that
//! keeps git plumbing out of the scanner.

pub mod inspector;
pub mod model;

pub use inspector::RepositoryInspector;
pub use model::{
    ContextPayload, FileInventory, FileTreeNode, ProjectInfo, ProjectKind, RepoMetadata,
    SearchMatch, SizeStats,
};
