//! Terminal presentation strategy.
//!
//! One interface, two implementations chosen once at startup: colored
//! output when the terminal supports it, plain text otherwise. The rest
//! of the CLI depends only on the trait.

use std::io::IsTerminal;

use colored::Colorize;

/// Structured output surface for the CLI.
pub trait Presenter {
    /// A titled block of text.
    fn panel(&self, title: &str, body: &str);
    /// A titled list of key/value rows.
    fn kv_table(&self, title: &str, rows: &[(String, String)]);
    /// One plain line.
    fn line(&self, text: &str);
    /// An error line.
    fn error(&self, text: &str);
}

/// Picks the presenter for this process.
///
/// Plain output wins when color is disabled in configuration, `NO_COLOR`
/// is set, or stdout is not a terminal.
pub fn select_presenter(color_enabled: bool) -> Box<dyn Presenter> {
    let plain = !color_enabled
        || std::env::var_os("NO_COLOR").is_some()
        || !std::io::stdout().is_terminal();
    if plain {
        Box::new(PlainPresenter)
    } else {
        Box::new(ColorPresenter)
    }
}

fn kv_width(rows: &[(String, String)]) -> usize {
    rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0)
}

/// Colored implementation backed by the `colored` crate.
pub struct ColorPresenter;

impl Presenter for ColorPresenter {
    fn panel(&self, title: &str, body: &str) {
        println!("{}", format!("── {} ──", title).bright_cyan().bold());
        for line in body.lines() {
            println!("  {}", line);
        }
        println!();
    }

    fn kv_table(&self, title: &str, rows: &[(String, String)]) {
        println!("{}", format!("── {} ──", title).bright_cyan().bold());
        let width = kv_width(rows);
        for (key, value) in rows {
            // Pad before styling; escape codes would break the alignment.
            let padded = format!("{:width$}", key, width = width);
            println!("  {}  {}", padded.dimmed(), value);
        }
        println!();
    }

    fn line(&self, text: &str) {
        println!("{}", text);
    }

    fn error(&self, text: &str) {
        eprintln!("{}", text.red());
    }
}

/// Plain fallback with identical structure and no styling.
pub struct PlainPresenter;

impl Presenter for PlainPresenter {
    fn panel(&self, title: &str, body: &str) {
        println!("-- {} --", title);
        for line in body.lines() {
            println!("  {}", line);
        }
        println!();
    }

    fn kv_table(&self, title: &str, rows: &[(String, String)]) {
        println!("-- {} --", title);
        let width = kv_width(rows);
        for (key, value) in rows {
            println!("  {:width$}  {}", key, value, width = width);
        }
        println!();
    }

    fn line(&self, text: &str) {
        println!("{}", text);
    }

    fn error(&self, text: &str) {
        eprintln!("{}", text);
    }
}
