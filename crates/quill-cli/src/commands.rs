//! Command handlers for the non-interactive CLI surface.

use std::io::Write as IoWrite;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use quill_application::{ChatEngine, ChatRequest};
use quill_core::project::ProjectKind;
use quill_core::session::{ConversationStore, StoreSettings};
use quill_infrastructure::{
    ConfigService, GitInspector, JsonSessionRepository, ProjectScanner, QuillPaths,
};
use quill_interaction::HttpPromptService;

use crate::present::Presenter;

/// Output format for `quill analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnalyzeFormat {
    Panel,
    Json,
    Table,
}

/// Wires the engine from the resolved configuration, the working
/// directory, and the HTTP prompt service.
pub fn build_engine() -> Result<ChatEngine> {
    let paths = QuillPaths::resolve()?;
    let config = ConfigService::load(paths)?;

    let history_limit = config.config().history_limit;
    let auto_save = config.config().auto_save;
    let sessions_dir = config.paths().sessions_dir();

    let store = ConversationStore::new(
        StoreSettings {
            history_limit,
            auto_save,
        },
        Arc::new(JsonSessionRepository::new(sessions_dir)),
    );
    let scanner = ProjectScanner::new(std::env::current_dir()?, Arc::new(GitInspector::new()))?;
    let service = Arc::new(HttpPromptService::new());

    Ok(ChatEngine::new(config, store, scanner, service))
}

/// `quill init [--force]` - materialize the default configuration files.
pub fn run_init(force: bool, presenter: &dyn Presenter) -> Result<()> {
    let paths = QuillPaths::resolve()?;
    let config = ConfigService::load(paths)?;

    if config.paths().config_file().exists() && !force {
        presenter.line(&format!(
            "configuration already exists at {} (use --force to overwrite)",
            config.paths().config_file().display()
        ));
        return Ok(());
    }

    config.ensure_config_dir()?;
    config.save()?;
    config.save_registry()?;
    for (_, dir) in config.paths().extension_dirs(&config.config().paths) {
        std::fs::create_dir_all(&dir)?;
    }

    presenter.panel(
        "initialized",
        &format!(
            "config:   {}\nproviders: {}\nsessions: {}",
            config.paths().config_file().display(),
            config.paths().llm_config_file().display(),
            config.paths().sessions_dir().display(),
        ),
    );
    Ok(())
}

/// Runs one chat exchange and prints the reply.
pub async fn run_exchange(
    engine: &mut ChatEngine,
    request: &ChatRequest,
    presenter: &dyn Presenter,
) -> Result<()> {
    if request.stream {
        let mut print_chunk = |chunk: &str| {
            print!("{}", chunk);
            let _ = std::io::stdout().flush();
        };
        engine.process_message(request, Some(&mut print_chunk)).await?;
        println!();
    } else {
        let reply = engine.process_message(request, None).await?;
        presenter.line(&reply);
    }
    Ok(())
}

/// `quill chat MESSAGE [--stream] [--context]` with a message given.
pub async fn run_chat_once(
    engine: &mut ChatEngine,
    message: String,
    stream: bool,
    context: bool,
    presenter: &dyn Presenter,
) -> Result<()> {
    let mut request = ChatRequest::new(message);
    request.stream = stream || engine.config().params.stream;
    request.include_context = context;
    run_exchange(engine, &request, presenter).await
}

/// `quill ask MESSAGE` - quick one-shot question, no history attached.
pub async fn run_ask(
    engine: &mut ChatEngine,
    message: String,
    presenter: &dyn Presenter,
) -> Result<()> {
    let mut request = ChatRequest::new(message);
    request.include_history = false;
    run_exchange(engine, &request, presenter).await
}

/// `quill generate TYPE [DESCRIPTION] [--output PATH] [--language LANG]`.
pub async fn run_generate(
    engine: &ChatEngine,
    kind: String,
    description: Option<String>,
    output: Option<PathBuf>,
    language: Option<String>,
    presenter: &dyn Presenter,
) -> Result<()> {
    let description = description.unwrap_or_default();
    let generated = engine
        .generate(&kind, &description, language.as_deref())
        .await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &generated)?;
            presenter.line(&format!("wrote {}", path.display()));
        }
        None => presenter.line(&generated),
    }
    Ok(())
}

/// `quill analyze [PATH] [--depth N] [--format panel|json|table]`.
pub fn run_analyze(
    path: Option<PathBuf>,
    depth: usize,
    format: AnalyzeFormat,
    presenter: &dyn Presenter,
) -> Result<()> {
    let root = match path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let scanner = ProjectScanner::new(root, Arc::new(GitInspector::new()))?;
    let info = scanner.info();

    match format {
        AnalyzeFormat::Json => {
            let tree = scanner.build_file_tree(depth, &[])?;
            let document = serde_json::json!({ "project": info, "tree": tree });
            presenter.line(&serde_json::to_string_pretty(&document)?);
        }
        AnalyzeFormat::Table => {
            presenter.kv_table(&info.name, &project_rows(info));
        }
        AnalyzeFormat::Panel => {
            let mut body = String::new();
            for (key, value) in project_rows(info) {
                body.push_str(&format!("{}: {}\n", key, value));
            }
            if !info.files.important.is_empty() {
                body.push_str(&format!("key files: {}\n", info.files.important.join(", ")));
            }
            presenter.panel(&info.name, &body);
        }
    }
    Ok(())
}

fn project_rows(info: &quill_core::project::ProjectInfo) -> Vec<(String, String)> {
    let mut rows = vec![
        ("path".to_string(), info.path.display().to_string()),
        ("kind".to_string(), info.kind.to_string()),
        ("files".to_string(), info.size.file_count.to_string()),
        ("bytes".to_string(), info.size.total_bytes.to_string()),
    ];
    match &info.repository {
        Some(repo) => {
            rows.push((
                "branch".to_string(),
                repo.branch.clone().unwrap_or_else(|| "unknown".to_string()),
            ));
            rows.push((
                "worktree".to_string(),
                if repo.dirty { "dirty" } else { "clean" }.to_string(),
            ));
            if let Some(url) = &repo.remote_url {
                rows.push(("remote".to_string(), url.clone()));
            }
        }
        None => rows.push(("repository".to_string(), "none".to_string())),
    }
    rows
}

/// `quill status` - health report.
pub async fn run_status(engine: &ChatEngine, presenter: &dyn Presenter) -> Result<()> {
    let report = engine.health_check().await;

    let mut rows = vec![
        (
            "healthy".to_string(),
            if report.healthy { "yes" } else { "no" }.to_string(),
        ),
        ("config".to_string(), report.config_path.display().to_string()),
        (
            "provider".to_string(),
            engine.config().default_provider.clone(),
        ),
    ];
    for issue in &report.issues {
        rows.push(("issue".to_string(), issue.clone()));
    }
    presenter.kv_table("status", &rows);
    Ok(())
}

/// `quill dashboard` - project, session, and health at a glance.
pub async fn run_dashboard(engine: &ChatEngine, presenter: &dyn Presenter) -> Result<()> {
    presenter.kv_table("project", &project_rows(engine.scanner().info()));

    let stats = engine.store().stats();
    presenter.kv_table("session", &stats_rows(&stats));

    run_status(engine, presenter).await
}

pub fn stats_rows(stats: &quill_core::session::SessionStats) -> Vec<(String, String)> {
    let mut rows = vec![
        ("session".to_string(), stats.session_id.clone()),
        ("messages".to_string(), stats.total_messages.to_string()),
        (
            "duration".to_string(),
            format!("{:.1}s", stats.duration_seconds),
        ),
        (
            "avg length".to_string(),
            format!("{:.0} chars", stats.average_message_length),
        ),
    ];
    for (role, count) in &stats.role_counts {
        rows.push((role.clone(), count.to_string()));
    }
    rows
}

/// `quill version`.
pub fn run_version(presenter: &dyn Presenter) {
    presenter.line(&format!("quill {}", env!("CARGO_PKG_VERSION")));
}

/// Kind-aware summary line for the interactive banner.
pub fn project_banner(kind: ProjectKind, name: &str) -> String {
    match kind {
        ProjectKind::General => format!("in {}", name),
        other => format!("in {} ({})", name, other),
    }
}
