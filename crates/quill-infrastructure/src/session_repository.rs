//! JSON file repository for conversation sessions.
//!
//! One `conversation_<session_id>.json` document per saved session, all
//! under the sessions directory. Implements the domain's [`SessionSink`]
//! contract, including its missing-versus-corrupt asymmetry.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use quill_core::error::Result;
use quill_core::session::{SessionSink, SessionSnapshot};

/// Session storage rooted at a directory of JSON files.
pub struct JsonSessionRepository {
    dir: PathBuf,
}

impl JsonSessionRepository {
    /// Creates a repository over the given directory. The directory is
    /// created lazily on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the session files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a logical name (with or without the `.json` suffix) to its
    /// file path.
    fn file_path(&self, name: &str) -> PathBuf {
        let name = name.strip_suffix(".json").unwrap_or(name);
        self.dir.join(format!("{}.json", name))
    }

    fn default_name(snapshot: &SessionSnapshot) -> String {
        format!("conversation_{}", snapshot.session_id)
    }
}

impl SessionSink for JsonSessionRepository {
    fn persist(&self, snapshot: &SessionSnapshot, name: Option<&str>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| Self::default_name(snapshot));
        let path = self.file_path(&name);

        let body = serde_json::to_string_pretty(snapshot)?;

        // Atomic write: tmp sibling + rename.
        let tmp_path = self.dir.join(format!(
            ".{}.tmp",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "session".to_string())
        ));
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(body.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);
        fs::rename(&tmp_path, &path)?;

        Ok(path)
    }

    fn retrieve(&self, name: &str) -> Result<Option<SessionSnapshot>> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let snapshot: SessionSnapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = file_name.strip_suffix(".json") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
