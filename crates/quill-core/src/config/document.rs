//! Working-document operations for configuration data.
//!
//! Configuration files are YAML on disk but are handled internally as
//! `serde_json::Value` so that merging, dotted-path access, and typed
//! deserialization all share one representation.

use serde_json::Value;

use crate::error::{QuillError, Result};

/// Parses a YAML document into a JSON working document.
///
/// An empty or whitespace-only input yields an empty object rather than an
/// error, so a missing file and a blank file behave the same.
///
/// # Arguments
///
/// * `source` - Raw YAML text
/// * `origin` - Display name of the file, used in error messages
pub fn yaml_to_document(source: &str, origin: &str) -> Result<Value> {
    if source.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let yaml_value: serde_yaml::Value = serde_yaml::from_str(source)
        .map_err(|e| QuillError::config(format!("invalid YAML in {}: {}", origin, e)))?;

    // serde_yaml::Value -> serde_json::Value via serde
    let json_value = serde_json::to_value(yaml_value)
        .map_err(|e| QuillError::config(format!("unrepresentable YAML in {}: {}", origin, e)))?;

    // A YAML document may legally be a bare scalar or list; configuration
    // documents must be mappings.
    if !json_value.is_object() {
        return Err(QuillError::config(format!(
            "{} must contain a mapping at the top level",
            origin
        )));
    }

    Ok(json_value)
}

/// Merges a loaded document over a defaults document.
///
/// Every top-level default key survives unless overridden. When both sides
/// hold an object for the same top-level key, the objects are merged one
/// level deep only: deeper substructures from the loaded document replace
/// the default's wholesale. A non-object loaded value wins outright.
pub fn merge_documents(defaults: &Value, loaded: &Value) -> Value {
    let mut merged = defaults.clone();

    let (Some(base), Some(overlay)) = (merged.as_object_mut(), loaded.as_object()) else {
        return loaded.clone();
    };

    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(base_nested)), Value::Object(overlay_nested)) => {
                // One level deep: nested keys override individually,
                // anything below replaces wholesale.
                for (nested_key, nested_value) in overlay_nested {
                    base_nested.insert(nested_key.clone(), nested_value.clone());
                }
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }

    merged
}

/// Navigates a document by dotted path, returning `default` when any
/// segment is absent or not an object.
pub fn get_path(document: &Value, dotted: &str, default: Value) -> Value {
    let mut current = document;
    for segment in dotted.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return default,
        }
    }
    current.clone()
}

/// Sets a value at a dotted path, creating intermediate objects as needed.
///
/// An intermediate segment holding a non-object value is replaced by an
/// object so the assignment always succeeds.
pub fn set_path(document: &mut Value, dotted: &str, value: Value) {
    if !document.is_object() {
        *document = Value::Object(serde_json::Map::new());
    }

    let segments: Vec<&str> = dotted.split('.').collect();
    let mut current = document;

    for segment in &segments[..segments.len() - 1] {
        let entry = current
            .as_object_mut()
            .expect("current is always an object here")
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(serde_json::Map::new());
        }
        current = entry;
    }

    current
        .as_object_mut()
        .expect("current is always an object here")
        .insert(segments[segments.len() - 1].to_string(), value);
}
