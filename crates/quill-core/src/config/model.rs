//! Typed configuration views.
//!
//! [`ResolvedConfig`] is deserialized from the merged working documents and
//! is the only configuration shape the rest of the application sees. It is
//! constructed once per process and handed to components by reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The kind of wire adapter a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Anthropic messages API shape.
    Anthropic,
    /// OpenAI chat-completions shape.
    #[serde(rename = "openai")]
    OpenAi,
    /// OpenAI-compatible local endpoint; no credential required.
    Local,
}

impl AdapterKind {
    /// Whether providers of this kind require a credential.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

/// One named LLM backend in the provider registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry name of this provider. Filled from the registry key during
    /// validation; never serialized.
    #[serde(skip)]
    pub name: String,
    /// Wire adapter this provider speaks.
    pub adapter: AdapterKind,
    /// Base URL of the provider endpoint.
    pub url: String,
    /// Raw credential pattern as written in the registry file; may be a
    /// `${VAR}` / `env:VAR` placeholder or a literal key.
    #[serde(default)]
    pub api_key: String,
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Credential after environment-variable substitution. Filled during
    /// validation; never serialized back to disk.
    #[serde(skip)]
    pub resolved_key: String,
}

/// Generation parameters forwarded to the prompt execution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature, valid range [0, 2].
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens to generate, must be positive.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Whether responses stream by default.
    #[serde(default)]
    pub stream: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stream: false,
        }
    }
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

/// Terminal presentation preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPreferences {
    /// Color theme name ("auto", "dark", "light").
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Whether colored output is enabled at all.
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            color: true,
        }
    }
}

fn default_theme() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

/// Extension-point directory names, resolved relative to the config
/// directory unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPaths {
    #[serde(default = "default_templates_dir")]
    pub templates: String,
    #[serde(default = "default_workers_dir")]
    pub workers: String,
    #[serde(default = "default_agents_dir")]
    pub agents: String,
    #[serde(default = "default_tools_dir")]
    pub tools: String,
}

impl Default for ExtensionPaths {
    fn default() -> Self {
        Self {
            templates: default_templates_dir(),
            workers: default_workers_dir(),
            agents: default_agents_dir(),
            tools: default_tools_dir(),
        }
    }
}

impl ExtensionPaths {
    /// All extension directories in a fixed order, labeled for reporting.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("templates", self.templates.as_str()),
            ("workers", self.workers.as_str()),
            ("agents", self.agents.as_str()),
            ("tools", self.tools.as_str()),
        ]
    }
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_workers_dir() -> String {
    "workers".to_string()
}

fn default_agents_dir() -> String {
    "agents".to_string()
}

fn default_tools_dir() -> String {
    "tools".to_string()
}

/// The one resolved runtime configuration.
///
/// Providers are keyed by name; iteration order is the lexicographic order
/// of provider names, which also defines "first registered" for the
/// default-provider substitution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Provider registry from `llm_config.yml`.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    /// Name of the provider used when a request does not name one.
    #[serde(default)]
    pub default_provider: String,
    /// Generation parameters; stored flat in `config.yml`.
    #[serde(flatten)]
    pub params: GenerationParams,
    /// Top-level theme name; `ui.theme` refines it for the presenter.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Terminal presentation preferences.
    #[serde(default)]
    pub ui: UiPreferences,
    /// How many history messages accompany a request by default.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Whether the conversation store persists automatically.
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// Log level used when `QUILL_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Extension-point directories.
    #[serde(default)]
    pub paths: ExtensionPaths,
}

fn default_history_limit() -> usize {
    20
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl ResolvedConfig {
    /// Builds the typed view from the merged preference and registry
    /// documents.
    ///
    /// The preferences document contributes everything except the provider
    /// registry; `default_provider` in preferences takes precedence over
    /// the registry file's top-level field.
    pub fn from_documents(preferences: &Value, registry: &Value) -> Result<Self> {
        let mut config: ResolvedConfig = serde_json::from_value(preferences.clone())?;

        if let Some(providers) = registry.get("providers") {
            config.providers = serde_json::from_value(providers.clone())?;
        }
        if config.default_provider.is_empty() {
            if let Some(name) = registry.get("default_provider").and_then(Value::as_str) {
                config.default_provider = name.to_string();
            }
        }

        Ok(config)
    }

    /// Looks up the configured default provider.
    pub fn default_provider_config(&self) -> Option<&ProviderConfig> {
        self.providers.get(&self.default_provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_documents_prefers_preferences_default_provider() {
        let prefs = json!({"default_provider": "alpha", "temperature": 0.5});
        let registry = json!({
            "default_provider": "beta",
            "providers": {
                "alpha": {"adapter": "openai", "url": "http://a", "default_model": "m"},
                "beta": {"adapter": "local", "url": "http://b", "default_model": "m"}
            }
        });

        let config = ResolvedConfig::from_documents(&prefs, &registry).unwrap();

        assert_eq!(config.default_provider, "alpha");
        assert_eq!(config.providers.len(), 2);
    }

    #[test]
    fn test_from_documents_falls_back_to_registry_default() {
        let prefs = json!({});
        let registry = json!({
            "default_provider": "beta",
            "providers": {
                "beta": {"adapter": "local", "url": "http://b", "default_model": "m"}
            }
        });

        let config = ResolvedConfig::from_documents(&prefs, &registry).unwrap();

        assert_eq!(config.default_provider, "beta");
    }

    #[test]
    fn test_defaults_fill_unset_fields() {
        let config = ResolvedConfig::from_documents(&json!({}), &json!({})).unwrap();

        assert_eq!(config.params.temperature, 0.7);
        assert_eq!(config.params.max_tokens, 2048);
        assert!(!config.params.stream);
        assert_eq!(config.history_limit, 20);
        assert!(config.auto_save);
        assert_eq!(config.theme, "auto");
        assert_eq!(config.ui.theme, "auto");
        assert_eq!(config.paths.templates, "templates");
    }

    #[test]
    fn test_adapter_kind_parses_lowercase() {
        let provider: ProviderConfig = serde_json::from_value(json!({
            "adapter": "anthropic",
            "url": "https://api.anthropic.com",
            "api_key": "${ANTHROPIC_API_KEY}",
            "default_model": "claude-sonnet-4-20250514"
        }))
        .unwrap();

        assert_eq!(provider.adapter, AdapterKind::Anthropic);
        assert!(provider.adapter.requires_credential());
        assert!(!AdapterKind::Local.requires_credential());
    }
}
