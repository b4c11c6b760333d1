//! YAML configuration file storage.
//!
//! Loads a YAML file into a `serde_json::Value` working document and
//! saves documents back atomically (tmp file + rename). A missing or
//! empty file loads as an empty document; only syntactically invalid
//! YAML is an error.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use serde_json::Value;

use quill_core::config::yaml_to_document;
use quill_core::error::{QuillError, Result};

/// Storage handle for one YAML configuration file.
pub struct YamlDocumentStorage {
    path: PathBuf,
}

impl YamlDocumentStorage {
    /// Creates a storage handle for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The underlying file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file as a working document.
    ///
    /// A missing file is an empty document, not an error. Invalid YAML
    /// fails with a configuration error naming the file.
    pub fn load(&self) -> Result<Value> {
        if !self.path.exists() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            QuillError::config(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        yaml_to_document(&content, &self.path.display().to_string())
    }

    /// Saves a working document back as YAML, atomically.
    ///
    /// Writes to a temporary sibling file, fsyncs, then renames over the
    /// target so a crash never leaves a half-written config.
    pub fn save(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        // serde_json::Value -> serde_yaml::Value via serde
        let yaml_value: serde_yaml::Value = serde_json::from_value(document.clone())?;
        let yaml_string = serde_yaml::to_string(&yaml_value)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(yaml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| QuillError::io("config path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| QuillError::io("config path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty_document() {
        let tmp = TempDir::new().unwrap();
        let storage = YamlDocumentStorage::new(tmp.path().join("config.yml"));

        let doc = storage.load().unwrap();
        assert!(doc.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = YamlDocumentStorage::new(tmp.path().join("config.yml"));
        let doc = json!({"temperature": 0.9, "ui": {"theme": "dark"}});

        storage.save(&doc).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded["temperature"], json!(0.9));
        assert_eq!(loaded["ui"]["theme"], json!("dark"));
    }

    #[test]
    fn test_load_invalid_yaml_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yml");
        fs::write(&path, "temperature: [unclosed").unwrap();
        let storage = YamlDocumentStorage::new(&path);

        let err = storage.load().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("config.yml"));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yml");
        let storage = YamlDocumentStorage::new(&path);

        storage.save(&json!({"a": 1})).unwrap();

        assert!(path.exists());
        assert!(!tmp.path().join(".config.yml.tmp").exists());
    }
}
