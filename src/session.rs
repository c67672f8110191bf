//! Interactive batch session: line commands, page rendering and the insight file.

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::batch::{BatchEngine, LoadOutcome, UnitStatus};
use crate::config::Selection;
use crate::error;

pub const HELP: &str = "\
Commands:
  show                 print the current page
  next | prev          move between pages
  size N               set the number of units per page
  edit I S TEXT        set field S of unit I on this page
  suggest I S          ask the model for field S of unit I
  suggest-page         fill every empty field on this page
  validate I           submit unit I to Weblate
  insights             print the insight log
  reload               fetch untranslated units again
  help                 show this help
  quit                 leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Next,
    Previous,
    PageSize(usize),
    Edit { unit: usize, field: usize, text: String },
    Suggest { unit: usize, field: usize },
    SuggestPage,
    Validate { unit: usize },
    Insights,
    Reload,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help' for the list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a positive number")]
    NotANumber(String),
}

/// What the session loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Print(String),
    Quit,
}

/// Unit and field numbers are 1-based on the command line.
fn ordinal(token: Option<&str>, usage: &'static str) -> Result<usize, CommandError> {
    let token = token.ok_or(CommandError::Usage(usage))?;
    match token.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::NotANumber(token.to_string())),
    }
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();
    let mut args = rest.split_whitespace();

    let command = match word {
        "" | "show" => Command::Show,
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Previous,
        "size" => {
            let token = args.next().ok_or(CommandError::Usage("size N"))?;
            match token.parse::<usize>() {
                Ok(n) if n > 0 => Command::PageSize(n),
                _ => return Err(CommandError::NotANumber(token.to_string())),
            }
        }
        "edit" => {
            let unit = ordinal(args.next(), "edit I S TEXT")?;
            let field = ordinal(args.next(), "edit I S TEXT")?;
            // Keep the text verbatim, inner spacing included.
            let text = rest
                .splitn(3, char::is_whitespace)
                .nth(2)
                .map(str::trim_start)
                .unwrap_or_default();
            Command::Edit { unit, field, text: text.to_string() }
        }
        "suggest" => Command::Suggest {
            unit: ordinal(args.next(), "suggest I S")?,
            field: ordinal(args.next(), "suggest I S")?,
        },
        "suggest-page" => Command::SuggestPage,
        "validate" | "v" => Command::Validate {
            unit: ordinal(args.next(), "validate I")?,
        },
        "insights" => Command::Insights,
        "reload" => Command::Reload,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn status_label(status: UnitStatus) -> &'static str {
    match status {
        UnitStatus::Pending => "pending",
        UnitStatus::Suggested => "suggested",
        UnitStatus::Validated => "validated",
        UnitStatus::Failed => "failed",
    }
}

pub fn render_page(engine: &BatchEngine) -> String {
    let mut out = String::new();
    if engine.units().is_empty() {
        out.push_str("No untranslated units.");
        return out;
    }

    let _ = writeln!(
        out,
        "Page {}/{} ({} per page, {} units)",
        engine.page_index() + 1,
        engine.page_count(),
        engine.page_size(),
        engine.units().len()
    );
    for (local, unit) in engine.current_page().iter().enumerate() {
        let _ = writeln!(out, "[{}] #{} {}", local + 1, unit.id, status_label(engine.status(unit.id)));
        if !unit.context.is_empty() {
            let _ = writeln!(out, "    context: {}", unit.context);
        }
        for (sub, (source, target)) in unit.source.iter().zip(&unit.translation).enumerate() {
            let _ = writeln!(out, "    {}> {}", sub + 1, source);
            let _ = writeln!(out, "    {}< {}", sub + 1, target);
        }
    }
    out.trim_end().to_string()
}

/// Run one command against the engine.
pub async fn dispatch(engine: &mut BatchEngine, selection: &Selection, command: Command) -> Reply {
    let text = match command {
        Command::Quit => return Reply::Quit,
        Command::Help => HELP.to_string(),
        Command::Show => render_page(engine),
        Command::Next => {
            if engine.next_page() {
                render_page(engine)
            } else {
                "Already on the last page.".to_string()
            }
        }
        Command::Previous => {
            if engine.previous_page() {
                render_page(engine)
            } else {
                "Already on the first page.".to_string()
            }
        }
        Command::PageSize(size) => match engine.set_page_size(size) {
            Ok(()) => render_page(engine),
            Err(e) => e.to_string(),
        },
        Command::Edit { unit, field, text } => match engine.edit_field(unit, field, text) {
            Ok(()) => render_page(engine),
            Err(e) => e.to_string(),
        },
        Command::Suggest { unit, field } => match engine.suggest(unit, field).await {
            Ok(suggestion) => format!("Suggestion: {}", suggestion),
            Err(e) => format!("Suggestion failed: {}", e),
        },
        Command::SuggestPage => {
            let report = engine.suggest_page().await;
            format!(
                "{}\n{} suggested, {} failed",
                render_page(engine),
                report.suggested,
                report.failed
            )
        }
        Command::Validate { unit } => {
            match engine.current_page().get(unit).map(|u| u.id) {
                None => format!("No unit {} on this page", unit + 1),
                Some(id) => {
                    if engine.validate(unit).await {
                        format!("Unit #{} validated", id)
                    } else {
                        format!("Unit #{} could not be submitted", id)
                    }
                }
            }
        }
        Command::Insights => {
            if engine.insight_log().trim().is_empty() {
                "No insights yet.".to_string()
            } else {
                engine.insight_log().trim().to_string()
            }
        }
        Command::Reload => match engine.load_units(selection).await {
            Ok(LoadOutcome::Loaded(_)) => render_page(engine),
            Ok(LoadOutcome::Skipped) => "Selection is incomplete, nothing loaded.".to_string(),
            Err(e) => format!("Reload failed: {}", e),
        },
    };
    Reply::Print(text)
}

/// Insight log saved by a previous session, empty when there is none.
pub async fn load_insights(path: &Path) -> error::Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            info!("Loaded insight log from {}", path.display());
            Ok(content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Persist the insight log. Failures are logged and the session goes on.
pub async fn save_insights(path: &Path, insights: &str) -> bool {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!("Failed to create {}: {}", parent.display(), e);
            return false;
        }
    }
    if let Err(e) = tokio::fs::write(path, insights).await {
        warn!("Failed to save insight log to {}: {}", path.display(), e);
        return false;
    }
    true
}
