//! Project context scanner.
//!
//! Inspects a working directory and produces the [`ProjectInfo`] snapshot:
//! detected kind, notable-file shortlists, size statistics, and repository
//! metadata. Also derives per-request [`ContextPayload`]s, depth-bounded
//! file trees, and filename/content search.
//!
//! Failure discipline: the scanner fails fast only when the root itself
//! does not exist. Every other filesystem irregularity (permission-denied
//! subtree, broken symlink, file vanishing mid-scan) degrades that single
//! entry and the scan continues.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use tracing::debug;

use quill_core::error::{QuillError, Result};
use quill_core::project::{
    ContextPayload, FileInventory, FileTreeNode, ProjectInfo, ProjectKind, RepositoryInspector,
    SearchMatch, SizeStats,
};

/// Directory names excluded from every scan, tree, and search.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "tmp",
    "temp",
    ".idea",
    ".vscode",
];

/// File extensions treated as binary and excluded from scans.
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "jar", "jpg", "jpeg", "png", "gif",
    "ico", "pdf", "zip", "tar", "gz", "7z",
];

/// Canonical important files, reported in this order when present.
const IMPORTANT_FILES: &[&str] = &[
    "README.md",
    "README",
    "LICENSE",
    "Gemfile",
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "pom.xml",
    "build.gradle",
    "Cargo.toml",
    "go.mod",
    "Makefile",
    "Dockerfile",
    "docker-compose.yml",
];

/// Extensions counted as config-like for the inventory shortlist.
const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml", "json", "toml", "ini"];

/// Extensions counted as source-like for the inventory shortlist.
const SOURCE_EXTENSIONS: &[&str] = &["rb", "js", "ts", "py", "java", "rs", "go", "c", "cpp", "h"];

/// Marker files deciding the project kind; first match wins.
const KIND_MARKERS: &[(&str, ProjectKind)] = &[
    ("Gemfile", ProjectKind::Ruby),
    ("package.json", ProjectKind::Node),
    ("requirements.txt", ProjectKind::Python),
    ("pyproject.toml", ProjectKind::Python),
    ("setup.py", ProjectKind::Python),
    ("pom.xml", ProjectKind::Java),
    ("build.gradle", ProjectKind::Java),
    ("Cargo.toml", ProjectKind::Rust),
    ("go.mod", ProjectKind::Go),
];

const CONFIG_SHORTLIST_LIMIT: usize = 5;
const SOURCE_SHORTLIST_LIMIT: usize = 10;

/// Default depth for the context payload's file tree.
const CONTEXT_TREE_DEPTH: usize = 2;

/// Scans a project directory and holds the current snapshot.
pub struct ProjectScanner {
    root: PathBuf,
    inspector: Arc<dyn RepositoryInspector>,
    info: ProjectInfo,
}

impl std::fmt::Debug for ProjectScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectScanner")
            .field("root", &self.root)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl ProjectScanner {
    /// Scans `root` and constructs the scanner.
    ///
    /// Fails only when `root` does not exist or is not a directory.
    pub fn new(root: impl Into<PathBuf>, inspector: Arc<dyn RepositoryInspector>) -> Result<Self> {
        let root = root.into();
        let info = Self::analyze(&root, inspector.as_ref())?;
        Ok(Self {
            root,
            inspector,
            info,
        })
    }

    /// The current project snapshot.
    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    /// Recomputes the snapshot and replaces it atomically; the previous
    /// snapshot is never partially updated.
    pub fn refresh(&mut self) -> Result<&ProjectInfo> {
        self.info = Self::analyze(&self.root, self.inspector.as_ref())?;
        Ok(&self.info)
    }

    /// Computes a fresh [`ProjectInfo`] for a directory.
    pub fn analyze(root: &Path, inspector: &dyn RepositoryInspector) -> Result<ProjectInfo> {
        if !root.is_dir() {
            return Err(QuillError::not_found(
                "directory",
                root.display().to_string(),
            ));
        }

        let absolute = root
            .canonicalize()
            .unwrap_or_else(|_| root.to_path_buf());
        let name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute.display().to_string());

        let kind = Self::detect_kind(&absolute);
        let files = Self::inventory(&absolute);
        let size = Self::size_stats(&absolute);
        let repository = inspector.inspect(&absolute);

        debug!(
            "analyzed {} ({}): {} files, {} bytes",
            name, kind, size.file_count, size.total_bytes
        );

        Ok(ProjectInfo {
            path: absolute,
            name,
            kind,
            files,
            size,
            repository,
        })
    }

    fn detect_kind(root: &Path) -> ProjectKind {
        for (marker, kind) in KIND_MARKERS {
            if root.join(marker).exists() {
                return *kind;
            }
        }
        if root.join(".git").is_dir() {
            return ProjectKind::GitRepo;
        }
        ProjectKind::General
    }

    fn inventory(root: &Path) -> FileInventory {
        let entries = sorted_entries(root);
        let file_names: Vec<String> = entries
            .iter()
            .filter(|(_, is_dir)| !is_dir)
            .map(|(name, _)| name.clone())
            .collect();

        let important = IMPORTANT_FILES
            .iter()
            .filter(|f| file_names.iter().any(|n| n == *f))
            .map(|f| f.to_string())
            .collect();

        let config = file_names
            .iter()
            .filter(|n| has_extension_in(n, CONFIG_EXTENSIONS))
            .take(CONFIG_SHORTLIST_LIMIT)
            .cloned()
            .collect();

        let source = file_names
            .iter()
            .filter(|n| has_extension_in(n, SOURCE_EXTENSIONS))
            .take(SOURCE_SHORTLIST_LIMIT)
            .cloned()
            .collect();

        FileInventory {
            important,
            config,
            source,
        }
    }

    fn size_stats(root: &Path) -> SizeStats {
        let mut stats = SizeStats::default();
        visit_files(root, root, &mut |_, metadata| {
            stats.file_count += 1;
            stats.total_bytes += metadata.len();
        });
        stats
    }

    /// Builds a depth-bounded file tree rooted at the project directory.
    ///
    /// Entries matching any ignore glob (against the relative path or the
    /// bare name) are skipped; depth beyond `max_depth` yields an empty
    /// subtree rather than an error.
    pub fn build_file_tree(&self, max_depth: usize, ignore_patterns: &[&str]) -> Result<FileTreeNode> {
        let globs = compile_globs(ignore_patterns)?;
        Ok(build_tree(&self.root, &self.root, max_depth, &globs))
    }

    /// Derives the bounded context payload attached to a request.
    ///
    /// Produced fresh on every call; nothing is cached. With
    /// `include_files`, each important file of size ≤ `max_file_bytes` is
    /// read in full (larger files are skipped, not truncated) and a read
    /// failure becomes that entry's inline error string.
    pub fn get_context(&self, include_files: bool, max_file_bytes: u64) -> ContextPayload {
        let files = include_files.then(|| self.read_important_files(max_file_bytes));
        let tree = self
            .build_file_tree(CONTEXT_TREE_DEPTH, &[])
            .ok();

        ContextPayload {
            name: self.info.name.clone(),
            kind: self.info.kind,
            repository: self.info.repository.clone(),
            generated_at: Utc::now().to_rfc3339(),
            files,
            tree,
        }
    }

    fn read_important_files(&self, max_file_bytes: u64) -> BTreeMap<String, String> {
        let mut contents = BTreeMap::new();
        for name in &self.info.files.important {
            let path = self.root.join(name);
            let size = match fs::metadata(&path) {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    contents.insert(name.clone(), format!("<error: {}>", err));
                    continue;
                }
            };
            if size > max_file_bytes {
                // Oversized files are skipped outright, not truncated.
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(body) => {
                    contents.insert(name.clone(), body);
                }
                Err(err) => {
                    contents.insert(name.clone(), format!("<error: {}>", err));
                }
            }
        }
        contents
    }

    /// Searches the project by filename or by content.
    ///
    /// Filename mode matches the relative path (or bare name) against a
    /// glob pattern. Content mode compiles the pattern as a regular
    /// expression and reports every matched substring per file; unreadable
    /// files are silently skipped.
    pub fn search(&self, pattern: &str, in_content: bool) -> Result<Vec<SearchMatch>> {
        if in_content {
            self.search_content(pattern)
        } else {
            self.search_filenames(pattern)
        }
    }

    fn search_filenames(&self, pattern: &str) -> Result<Vec<SearchMatch>> {
        let glob = Glob::new(pattern)
            .map_err(|e| QuillError::invalid_argument(format!("bad glob '{}': {}", pattern, e)))?
            .compile_matcher();

        let mut matches = Vec::new();
        visit_files(&self.root, &self.root, &mut |path, _| {
            let relative = relative_display(&self.root, path);
            let name_matches = path
                .file_name()
                .map(|n| glob.is_match(Path::new(n)))
                .unwrap_or(false);
            if glob.is_match(&relative) || name_matches {
                matches.push(SearchMatch {
                    path: relative,
                    matches: Vec::new(),
                });
            }
        });
        Ok(matches)
    }

    fn search_content(&self, pattern: &str) -> Result<Vec<SearchMatch>> {
        let regex = Regex::new(pattern)
            .map_err(|e| QuillError::invalid_argument(format!("bad pattern '{}': {}", pattern, e)))?;

        let mut matches = Vec::new();
        visit_files(&self.root, &self.root, &mut |path, _| {
            let Ok(body) = fs::read_to_string(path) else {
                return; // unreadable or non-UTF-8: skip silently
            };
            let found: Vec<String> = regex
                .find_iter(&body)
                .map(|m| m.as_str().to_string())
                .collect();
            if !found.is_empty() {
                matches.push(SearchMatch {
                    path: relative_display(&self.root, path),
                    matches: found,
                });
            }
        });
        Ok(matches)
    }
}

/// Whether a directory entry is excluded by the fixed ignore rules.
fn is_ignored(name: &str, is_dir: bool) -> bool {
    if name.starts_with('.') {
        return true;
    }
    if is_dir {
        return IGNORED_DIRS.contains(&name);
    }
    has_extension_in(name, BINARY_EXTENSIONS)
}

fn has_extension_in(name: &str, extensions: &[&str]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            extensions.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Lists a directory as `(name, is_dir)` pairs, lexicographically sorted,
/// with ignored entries removed. Unreadable directories list as empty.
fn sorted_entries(dir: &Path) -> Vec<(String, bool)> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut entries: Vec<(String, bool)> = read
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (!is_ignored(&name, is_dir)).then_some((name, is_dir))
        })
        .collect();
    entries.sort();
    entries
}

/// Depth-first visit of every non-ignored file under `dir`, skipping
/// anything unreadable.
fn visit_files(root: &Path, dir: &Path, visit: &mut impl FnMut(&Path, &fs::Metadata)) {
    for (name, is_dir) in sorted_entries(dir) {
        let path = dir.join(&name);
        if is_dir {
            visit_files(root, &path, visit);
        } else if let Ok(metadata) = fs::metadata(&path) {
            visit(&path, &metadata);
        }
    }
}

fn build_tree(root: &Path, dir: &Path, depth: usize, globs: &GlobSet) -> FileTreeNode {
    if depth == 0 {
        return FileTreeNode::empty_dir();
    }

    let mut children = BTreeMap::new();
    for (name, is_dir) in sorted_entries(dir) {
        let path = dir.join(&name);
        let relative = relative_display(root, &path);
        if globs.is_match(&relative) || globs.is_match(Path::new(&name)) {
            continue;
        }
        let node = if is_dir {
            build_tree(root, &path, depth - 1, globs)
        } else {
            FileTreeNode::File(fs::metadata(&path).map(|m| m.len()).unwrap_or(0))
        };
        children.insert(name, node);
    }
    FileTreeNode::Directory(children)
}

fn compile_globs(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| QuillError::invalid_argument(format!("bad glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| QuillError::invalid_argument(format!("bad glob set: {}", e)))
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
