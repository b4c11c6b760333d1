//! Configuration resolver service.
//!
//! Loads the two YAML documents (user preferences and the LLM provider
//! registry), merges them over built-in defaults, and exposes the typed
//! [`ResolvedConfig`] view plus dotted-path access to the preference
//! document. Constructed once per process and injected into everything
//! that needs configuration.

use serde_json::{json, Value};

use quill_core::config::{
    get_path, merge_documents, set_path, validate_config, ResolvedConfig,
};
use quill_core::error::Result;

use crate::config_storage::YamlDocumentStorage;
use crate::paths::QuillPaths;

/// Built-in user preference defaults.
fn default_preferences() -> Value {
    json!({
        "default_provider": "",
        "temperature": 0.7,
        "max_tokens": 2048,
        "stream": false,
        "theme": "auto",
        "log_level": "warn",
        "history_limit": 20,
        "auto_save": true,
        "ui": {
            "theme": "auto",
            "color": true
        },
        "paths": {
            "templates": "templates",
            "workers": "workers",
            "agents": "agents",
            "tools": "tools"
        }
    })
}

/// Built-in provider registry defaults.
///
/// Credentials are environment-variable placeholders; an unset variable
/// resolves to an empty credential and a validation warning, never an
/// error.
fn default_registry() -> Value {
    json!({
        "default_provider": "openai",
        "providers": {
            "openai": {
                "adapter": "openai",
                "url": "https://api.openai.com/v1/chat/completions",
                "api_key": "${OPENAI_API_KEY}",
                "default_model": "gpt-4o"
            },
            "anthropic": {
                "adapter": "anthropic",
                "url": "https://api.anthropic.com/v1/messages",
                "api_key": "${ANTHROPIC_API_KEY}",
                "default_model": "claude-sonnet-4-20250514"
            }
        }
    })
}

/// The resolved runtime configuration plus its source documents.
#[derive(Debug)]
pub struct ConfigService {
    paths: QuillPaths,
    preferences: Value,
    registry: Value,
    config: ResolvedConfig,
    warnings: Vec<String>,
}

impl ConfigService {
    /// Loads and resolves configuration from the given path set.
    ///
    /// Missing files are treated as empty documents; invalid YAML fails
    /// with a configuration error naming the offending file.
    pub fn load(paths: QuillPaths) -> Result<Self> {
        let user_preferences = YamlDocumentStorage::new(paths.config_file()).load()?;
        let user_registry = YamlDocumentStorage::new(paths.llm_config_file()).load()?;

        let preferences = merge_documents(&default_preferences(), &user_preferences);
        let registry = merge_documents(&default_registry(), &user_registry);

        let mut config = ResolvedConfig::from_documents(&preferences, &registry)?;
        let warnings = validate_config(&mut config);

        Ok(Self {
            paths,
            preferences,
            registry,
            config,
            warnings,
        })
    }

    /// The typed resolved configuration.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Warnings collected while validating. An empty provider registry is
    /// the one condition callers should escalate to unhealthy.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The path set this service resolves against.
    pub fn paths(&self) -> &QuillPaths {
        &self.paths
    }

    /// Dotted-path read from the merged preference document.
    pub fn get(&self, dotted: &str, default: Value) -> Value {
        get_path(&self.preferences, dotted, default)
    }

    /// Dotted-path write into the in-memory preference document,
    /// re-deriving the typed view. Nothing reaches disk until
    /// [`ConfigService::save`].
    pub fn set(&mut self, dotted: &str, value: Value) -> Result<()> {
        set_path(&mut self.preferences, dotted, value);
        self.config = ResolvedConfig::from_documents(&self.preferences, &self.registry)?;
        self.warnings = validate_config(&mut self.config);
        Ok(())
    }

    /// Creates the configuration directory tree. Idempotent.
    pub fn ensure_config_dir(&self) -> Result<()> {
        self.paths.ensure_config_dir()
    }

    /// Persists the in-memory preference document to `config.yml`,
    /// overwriting the file.
    pub fn save(&self) -> Result<()> {
        self.ensure_config_dir()?;
        YamlDocumentStorage::new(self.paths.config_file()).save(&self.preferences)
    }

    /// Persists the in-memory registry document to `llm_config.yml`.
    /// Used by the init flow to materialize the default registry.
    pub fn save_registry(&self) -> Result<()> {
        self.ensure_config_dir()?;
        YamlDocumentStorage::new(self.paths.llm_config_file()).save(&self.registry)
    }
}
