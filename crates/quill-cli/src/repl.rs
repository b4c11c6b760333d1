//! Interactive read loop.
//!
//! A rustyline editor with slash-command completion, hints, and
//! highlighting. Every command error is printed and the loop continues;
//! only `exit`/`quit`/`bye`, Ctrl-C, or Ctrl-D leave the session.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::OnceLock;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use quill_application::{ChatEngine, ChatRequest};

use crate::commands::{project_banner, run_exchange, run_status, stats_rows};
use crate::present::Presenter;

/// An in-band command available inside the interactive loop.
pub struct BuiltinCommand {
    /// Command text as typed (including the leading `/` where one exists).
    pub name: &'static str,
    /// Usage format.
    pub usage: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

static BUILTIN_COMMANDS: OnceLock<Vec<BuiltinCommand>> = OnceLock::new();

/// Returns all in-band commands. Initialized once and cached.
pub fn builtin_commands() -> &'static [BuiltinCommand] {
    BUILTIN_COMMANDS.get_or_init(|| {
        vec![
            BuiltinCommand {
                name: "help",
                usage: "help",
                description: "Show available commands",
            },
            BuiltinCommand {
                name: "status",
                usage: "status",
                description: "Show health and session status",
            },
            BuiltinCommand {
                name: "clear",
                usage: "clear",
                description: "Clear the screen",
            },
            BuiltinCommand {
                name: "exit",
                usage: "exit | quit | bye",
                description: "Leave the interactive session",
            },
            BuiltinCommand {
                name: "/save",
                usage: "/save [name]",
                description: "Save the conversation (named, or to its default file)",
            },
            BuiltinCommand {
                name: "/load",
                usage: "/load <name>",
                description: "Load a saved conversation, replacing the current one",
            },
            BuiltinCommand {
                name: "/clear",
                usage: "/clear",
                description: "Clear the conversation and start a new session",
            },
            BuiltinCommand {
                name: "/stats",
                usage: "/stats",
                description: "Show statistics for the current session",
            },
        ]
    })
}

/// CLI helper for rustyline that provides completion, highlighting, and
/// hints for slash commands.
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: builtin_commands()
                .iter()
                .filter(|command| command.name.starts_with('/'))
                .map(|command| command.name.to_string())
                .collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|command| command.starts_with(line))
                .map(|command| Pair {
                    display: command.clone(),
                    replacement: command.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|command| command.starts_with(line) && command.len() > line.len())
                .map(|command| command[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

enum LoopControl {
    Continue,
    Exit,
}

/// Runs the interactive session until exit or interrupt.
pub async fn run(
    engine: &mut ChatEngine,
    presenter: &dyn Presenter,
    stream: bool,
    context: bool,
) -> Result<()> {
    let info = engine.scanner().info();
    presenter.line(&format!(
        "quill {} - {}. Type 'help' for commands, 'exit' to leave.",
        env!("CARGO_PKG_VERSION"),
        project_banner(info.kind, &info.name)
    ));

    let mut editor: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(CliHelper::new()));

    loop {
        match editor.readline("quill> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);

                match handle_line(engine, presenter, &line, stream, context).await {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    // One bad command must not terminate the session.
                    Err(err) => presenter.error(&format!("error: {}", err)),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                presenter.error(&format!("input error: {}", err));
                break;
            }
        }
    }

    presenter.line("goodbye");
    Ok(())
}

async fn handle_line(
    engine: &mut ChatEngine,
    presenter: &dyn Presenter,
    line: &str,
    stream: bool,
    context: bool,
) -> Result<LoopControl> {
    match line {
        "exit" | "quit" | "bye" => return Ok(LoopControl::Exit),
        "help" => {
            let rows: Vec<(String, String)> = builtin_commands()
                .iter()
                .map(|command| (command.usage.to_string(), command.description.to_string()))
                .collect();
            presenter.kv_table("commands", &rows);
        }
        "status" => run_status(engine, presenter).await?,
        "clear" => {
            // Clear screen and move the cursor home.
            print!("\x1b[2J\x1b[H");
        }
        _ if line.starts_with('/') => handle_slash_command(engine, presenter, line)?,
        _ => {
            let mut request = ChatRequest::new(line);
            request.stream = stream;
            request.include_context = context;
            run_exchange(engine, &request, presenter).await?;
        }
    }
    Ok(LoopControl::Continue)
}

fn handle_slash_command(
    engine: &mut ChatEngine,
    presenter: &dyn Presenter,
    line: &str,
) -> Result<()> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let argument = parts.next();

    match command {
        "/save" => {
            let path = engine.store_mut().save(argument)?;
            presenter.line(&format!("saved to {}", path.display()));
        }
        "/load" => {
            let Some(name) = argument else {
                presenter.error("usage: /load <name>");
                return Ok(());
            };
            if engine.store_mut().load(name)? {
                presenter.line(&format!(
                    "loaded '{}' ({} messages)",
                    name,
                    engine.store().len()
                ));
            } else {
                let available = engine.store().list_sessions().unwrap_or_default();
                presenter.error(&format!(
                    "no saved conversation named '{}' (available: {})",
                    name,
                    if available.is_empty() {
                        "none".to_string()
                    } else {
                        available.join(", ")
                    }
                ));
            }
        }
        "/clear" => {
            engine.store_mut().clear();
            presenter.line(&format!(
                "conversation cleared; new session {}",
                engine.store().session_id()
            ));
        }
        "/stats" => {
            presenter.kv_table("session", &stats_rows(&engine.store().stats()));
        }
        other => {
            presenter.error(&format!("unknown command '{}'; try 'help'", other));
        }
    }
    Ok(())
}
