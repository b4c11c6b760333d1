//! Git repository inspector.
//!
//! Shells out to the `git` binary for plain facts: whether a directory is
//! inside a work tree, the current branch, dirty state, and the origin
//! remote. Any failure (no git, not a repo, unreadable output) degrades to
//! "not a repository".

use std::path::Path;
use std::process::Command;

use quill_core::project::{RepoMetadata, RepositoryInspector};

/// Inspector backed by the system `git` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitInspector;

impl GitInspector {
    pub fn new() -> Self {
        Self
    }

    fn git_stdout(dir: &Path, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .current_dir(dir)
            .args(args)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn is_work_tree(dir: &Path) -> bool {
        Self::git_stdout(dir, &["rev-parse", "--is-inside-work-tree"])
            .map(|out| out == "true")
            .unwrap_or(false)
    }
}

impl RepositoryInspector for GitInspector {
    fn inspect(&self, dir: &Path) -> Option<RepoMetadata> {
        if !Self::is_work_tree(dir) {
            return None;
        }

        let branch = Self::git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"]);
        let dirty = Self::git_stdout(dir, &["status", "--porcelain"])
            .map(|out| !out.is_empty())
            .unwrap_or(false);
        let remote_url =
            Self::git_stdout(dir, &["remote", "get-url", "origin"]).filter(|url| !url.is_empty());

        Some(RepoMetadata {
            branch,
            dirty,
            remote_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .current_dir(dir)
            .args(args)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    #[test]
    fn test_non_repository_is_none() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();

        assert!(GitInspector::new().inspect(tmp.path()).is_none());
    }

    #[test]
    fn test_fresh_repository_reports_metadata() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        if !git(tmp.path(), &["init", "-q"]) {
            return;
        }

        std::fs::write(tmp.path().join("a.txt"), "x").unwrap();
        let metadata = GitInspector::new().inspect(tmp.path()).unwrap();

        assert!(metadata.branch.is_some());
        // Untracked file makes the tree dirty.
        assert!(metadata.dirty);
        assert!(metadata.remote_url.is_none());
    }
}
