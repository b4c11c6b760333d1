//! Unified path management for Quill configuration files.
//!
//! All configuration and session data live under one config directory.
//! The directory is platform-resolved via `dirs`, and `QUILL_CONFIG_DIR`
//! overrides it (tests rely on this).
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/quill/             # Config directory
//! ├── config.yml               # User preferences
//! ├── llm_config.yml           # LLM provider registry
//! ├── sessions/                # Saved conversations
//! ├── templates/               # Prompt template extension point
//! ├── workers/                 # Worker extension point
//! ├── agents/                  # Agent extension point
//! └── tools/                   # Tool extension point
//! ```

use std::path::{Path, PathBuf};

use quill_core::config::ExtensionPaths;
use quill_core::error::{QuillError, Result};

/// Path resolver for the Quill configuration tree.
#[derive(Debug, Clone)]
pub struct QuillPaths {
    config_dir: PathBuf,
}

impl QuillPaths {
    /// Resolves the config directory from the environment or the platform
    /// convention.
    pub fn resolve() -> Result<Self> {
        if let Ok(dir) = std::env::var("QUILL_CONFIG_DIR") {
            if !dir.is_empty() {
                return Ok(Self {
                    config_dir: PathBuf::from(dir),
                });
            }
        }

        let base = dirs::config_dir()
            .ok_or_else(|| QuillError::io("cannot determine the user config directory"))?;
        Ok(Self {
            config_dir: base.join("quill"),
        })
    }

    /// Builds a resolver rooted at an explicit directory.
    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// The Quill configuration directory.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path to the user preferences file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.yml")
    }

    /// Path to the provider registry file.
    pub fn llm_config_file(&self) -> PathBuf {
        self.config_dir.join("llm_config.yml")
    }

    /// Path to the saved-conversations directory.
    pub fn sessions_dir(&self) -> PathBuf {
        self.config_dir.join("sessions")
    }

    /// Resolves one extension-point directory: absolute entries stand
    /// alone, relative ones live under the config directory.
    pub fn extension_dir(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// All extension-point directories in declaration order.
    pub fn extension_dirs(&self, paths: &ExtensionPaths) -> Vec<(&'static str, PathBuf)> {
        paths
            .entries()
            .iter()
            .map(|(label, dir)| (*label, self.extension_dir(dir)))
            .collect()
    }

    /// Creates the configuration directory tree. Idempotent.
    pub fn ensure_config_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(self.sessions_dir())?;
        Ok(())
    }
}
