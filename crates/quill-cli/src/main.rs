//! Quill - a configuration-driven terminal assistant for LLM providers.

mod commands;
mod present;
mod repl;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::AnalyzeFormat;

#[derive(Parser)]
#[command(name = "quill", version, about = "A terminal assistant for LLM providers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create the default configuration files
    Init {
        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
    /// Chat with the assistant; without a message, enter the interactive loop
    Chat {
        /// Message to send
        message: Option<String>,
        /// Stream the response incrementally
        #[arg(long)]
        stream: bool,
        /// Attach project context to the request
        #[arg(long)]
        context: bool,
    },
    /// Ask a quick one-shot question (no conversation history)
    Ask {
        /// The question
        message: String,
    },
    /// Generate code, tests, or docs
    Generate {
        /// What to generate: code, test, or doc
        #[arg(value_name = "TYPE")]
        kind: String,
        /// Description of what to generate
        description: Option<String>,
        /// Write the result to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Target language
        #[arg(long)]
        language: Option<String>,
    },
    /// Analyze a project directory
    Analyze {
        /// Directory to analyze (defaults to the working directory)
        path: Option<PathBuf>,
        /// File tree depth
        #[arg(long, default_value_t = 3)]
        depth: usize,
        /// Output format
        #[arg(long, value_enum, default_value = "panel")]
        format: AnalyzeFormat,
    },
    /// Show configuration health
    Status,
    /// Show project, session, and health at a glance
    Dashboard,
    /// Print the version
    Version,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Presenter selection happens once per invocation; everything
    // downstream depends only on the trait. Commands that load the
    // configuration re-select with the configured color preference.
    let presenter = present::select_presenter(true);

    match cli.command {
        Some(Command::Init { force }) => commands::run_init(force, presenter.as_ref())?,
        Some(Command::Chat {
            message,
            stream,
            context,
        }) => {
            let mut engine = commands::build_engine()?;
            let presenter = present::select_presenter(engine.config().ui.color);
            match message {
                Some(message) => {
                    commands::run_chat_once(&mut engine, message, stream, context, presenter.as_ref())
                        .await?
                }
                None => repl::run(&mut engine, presenter.as_ref(), stream, context).await?,
            }
        }
        Some(Command::Ask { message }) => {
            let mut engine = commands::build_engine()?;
            let presenter = present::select_presenter(engine.config().ui.color);
            commands::run_ask(&mut engine, message, presenter.as_ref()).await?;
        }
        Some(Command::Generate {
            kind,
            description,
            output,
            language,
        }) => {
            let engine = commands::build_engine()?;
            let presenter = present::select_presenter(engine.config().ui.color);
            commands::run_generate(&engine, kind, description, output, language, presenter.as_ref())
                .await?;
        }
        Some(Command::Analyze {
            path,
            depth,
            format,
        }) => commands::run_analyze(path, depth, format, presenter.as_ref())?,
        Some(Command::Status) => {
            let engine = commands::build_engine()?;
            let presenter = present::select_presenter(engine.config().ui.color);
            commands::run_status(&engine, presenter.as_ref()).await?;
        }
        Some(Command::Dashboard) => {
            let engine = commands::build_engine()?;
            let presenter = present::select_presenter(engine.config().ui.color);
            commands::run_dashboard(&engine, presenter.as_ref()).await?;
        }
        Some(Command::Version) => commands::run_version(presenter.as_ref()),
        None => {
            let mut engine = commands::build_engine()?;
            let presenter = present::select_presenter(engine.config().ui.color);
            let stream = engine.config().params.stream;
            repl::run(&mut engine, presenter.as_ref(), stream, false).await?;
        }
    }

    Ok(())
}
