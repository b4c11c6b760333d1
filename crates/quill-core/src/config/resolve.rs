//! Credential resolution and configuration validation.
//!
//! Validation never fails: it repairs what it can (default-provider
//! substitution) and reports everything else as warnings. Requests with a
//! missing credential are allowed to proceed and fail at the provider
//! boundary instead.

use tracing::warn;

use super::model::ResolvedConfig;

/// Resolves a credential pattern against the process environment.
///
/// Recognized placeholder forms:
/// - `${VAR}` - value of `VAR`, empty string if unset
/// - `env:VAR` - same
///
/// Anything else is treated as a literal credential and returned unchanged.
pub fn resolve_credential(raw: &str) -> String {
    let var_name = if let Some(inner) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        Some(inner)
    } else {
        raw.strip_prefix("env:")
    };

    match var_name {
        Some(name) => std::env::var(name.trim()).unwrap_or_default(),
        None => raw.to_string(),
    }
}

/// Validates the resolved configuration, repairing and warning in place.
///
/// Performed checks:
/// - empty provider registry (warning; callers treat this one as fatal for
///   health purposes)
/// - default provider missing from the registry: substitute the first
///   registered provider (lexicographic order) and warn
/// - resolve every provider credential; warn for each non-local provider
///   whose resolved credential is empty
///
/// Returns the warning list; never errors.
pub fn validate_config(config: &mut ResolvedConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.providers.is_empty() {
        warnings.push("provider registry is empty; no requests can be dispatched".to_string());
    } else if !config.providers.contains_key(&config.default_provider) {
        let substitute = config
            .providers
            .keys()
            .next()
            .expect("registry is non-empty")
            .clone();
        warnings.push(format!(
            "default provider '{}' is not registered; using '{}'",
            config.default_provider, substitute
        ));
        config.default_provider = substitute;
    }

    for (name, provider) in config.providers.iter_mut() {
        provider.name = name.clone();
        provider.resolved_key = resolve_credential(&provider.api_key);
        if provider.adapter.requires_credential() && provider.resolved_key.is_empty() {
            warnings.push(format!(
                "provider '{}' has no credential; requests to it will fail",
                name
            ));
        }
    }

    for warning in &warnings {
        warn!("config: {}", warning);
    }

    warnings
}
