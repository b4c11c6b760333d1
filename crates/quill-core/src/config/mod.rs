//! Configuration domain: documents, typed views, and validation.
//!
//! Configuration lives in two YAML files (user preferences and the LLM
//! provider registry). Both are parsed into `serde_json::Value` working
//! documents, merged over built-in defaults, and then deserialized into a
//! typed [`ResolvedConfig`] that the rest of the application consumes.

pub mod document;
pub mod model;
pub mod resolve;

pub use document::{get_path, merge_documents, set_path, yaml_to_document};
pub use model::{
    AdapterKind, ExtensionPaths, GenerationParams, ProviderConfig, ResolvedConfig, UiPreferences,
};
pub use resolve::{resolve_credential, validate_config};
