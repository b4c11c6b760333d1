//! Prompt templates.
//!
//! The system prompt is rendered through minijinja from the context
//! payload; generation prompts are fixed per kind.

use minijinja::Environment;

use quill_core::error::{QuillError, Result};
use quill_core::project::ContextPayload;

/// System prompt used when no project context is attached.
pub const BASE_SYSTEM_PROMPT: &str =
    "You are Quill, a terminal assistant. Keep answers concise and practical.";

const CONTEXT_SYSTEM_TEMPLATE: &str = r#"You are Quill, a terminal assistant. Keep answers concise and practical.
Answer with the project context below in mind.

Project: {{ name }} ({{ kind }})
Snapshot: {{ generated_at }}
{%- if repository %}
Branch: {% if repository.branch %}{{ repository.branch }}{% else %}unknown{% endif %}{% if repository.dirty %} (uncommitted changes){% endif %}
{%- endif %}
{%- if files %}

Key files:
{%- for path, body in files|items %}

--- {{ path }} ---
{{ body }}
{%- endfor %}
{%- endif %}
"#;

/// Renders the context-aware system prompt.
pub fn render_system_prompt(context: &ContextPayload) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", CONTEXT_SYSTEM_TEMPLATE)
        .map_err(|e| QuillError::internal(format!("system template is invalid: {}", e)))?;
    let template = env
        .get_template("system")
        .map_err(|e| QuillError::internal(format!("system template missing: {}", e)))?;
    template
        .render(context)
        .map_err(|e| QuillError::internal(format!("system template render failed: {}", e)))
}

/// Builds the one-shot prompt for `generate TYPE`.
///
/// Unknown kinds are an invalid argument, reported before any request is
/// made.
pub fn build_generate_prompt(
    kind: &str,
    description: &str,
    language: Option<&str>,
) -> Result<String> {
    let language = language.unwrap_or("the most fitting language");
    let body = match kind {
        "code" => format!(
            "Write {} code for the following task. Reply with code only.\n\nTask: {}",
            language, description
        ),
        "test" => format!(
            "Write unit tests in {} for the following behavior. Reply with code only.\n\nBehavior: {}",
            language, description
        ),
        "doc" => format!(
            "Write documentation for the following. Reply in Markdown.\n\nSubject: {}",
            description
        ),
        other => {
            return Err(QuillError::invalid_argument(format!(
                "unknown generate type '{}'; expected code, test, or doc",
                other
            )))
        }
    };
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::project::{ProjectKind, RepoMetadata};
    use std::collections::BTreeMap;

    fn payload() -> ContextPayload {
        ContextPayload {
            name: "demo".to_string(),
            kind: ProjectKind::Ruby,
            repository: Some(RepoMetadata {
                branch: Some("main".to_string()),
                dirty: true,
                remote_url: None,
            }),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            files: Some(BTreeMap::from([(
                "README.md".to_string(),
                "# Demo".to_string(),
            )])),
            tree: None,
        }
    }

    #[test]
    fn test_system_prompt_includes_project_facts() {
        let rendered = render_system_prompt(&payload()).unwrap();

        assert!(rendered.contains("Project: demo (ruby)"));
        assert!(rendered.contains("Branch: main (uncommitted changes)"));
        assert!(rendered.contains("--- README.md ---"));
        assert!(rendered.contains("# Demo"));
    }

    #[test]
    fn test_system_prompt_without_repository_or_files() {
        let mut context = payload();
        context.repository = None;
        context.files = None;

        let rendered = render_system_prompt(&context).unwrap();

        assert!(!rendered.contains("Branch:"));
        assert!(!rendered.contains("Key files:"));
    }

    #[test]
    fn test_generate_prompt_kinds() {
        let code = build_generate_prompt("code", "parse a CSV", Some("Rust")).unwrap();
        assert!(code.contains("Rust"));
        assert!(code.contains("parse a CSV"));

        assert!(build_generate_prompt("doc", "the config format", None).is_ok());

        let err = build_generate_prompt("poem", "x", None).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
