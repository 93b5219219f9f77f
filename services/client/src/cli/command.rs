//! services/client/src/cli/command.rs
//!
//! Parses one line of terminal input into a `Command`.

use crate::error::SessionError;
use std::path::PathBuf;

/// A user intent typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Refetch and list the scopes.
    Scopes,
    New(String),
    /// Switch by list number or by name.
    Use(String),
    Global,
    Rename { target: String, name: String },
    Docs,
    Refresh,
    /// Delete by number in the last document listing.
    Delete(usize),
    Pick(PathBuf),
    Upload,
    Help,
    Quit,
    Ask(String),
}

pub const HELP: &str = "\
Commands:
  /scopes                 list subjects
  /new <name>             create a subject and switch to it
  /use <n|name>           switch to a subject (clears the conversation)
  /global                 ask across all documents (clears the conversation)
  /rename <n> <name>      rename a subject
  /docs                   list documents in the current subject
  /refresh                refetch the document list to see indexing progress
  /delete <n>             delete a document (asks for confirmation)
  /pick <path>            select a PDF for upload
  /upload                 upload the selected PDF into the current subject
  /help                   show this help
  /quit                   leave
Anything else is sent as a question.";

/// Parses a line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, SessionError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Ask(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "scopes" | "folders" => Command::Scopes,
        "new" => Command::New(required(arg, "/new <name>")?.to_string()),
        "use" => Command::Use(required(arg, "/use <n|name>")?.to_string()),
        "global" | "all" => Command::Global,
        "rename" => {
            let usage = "/rename <n> <name>";
            let (target, new_name) = required(arg, usage)?
                .split_once(char::is_whitespace)
                .ok_or_else(|| usage_error(usage))?;
            Command::Rename {
                target: target.to_string(),
                name: required(new_name, usage)?.to_string(),
            }
        }
        "docs" | "files" => Command::Docs,
        "refresh" => Command::Refresh,
        "delete" | "rm" => {
            let usage = "/delete <n>";
            let n = required(arg, usage)?
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| usage_error(usage))?;
            Command::Delete(n)
        }
        "pick" => Command::Pick(PathBuf::from(required(arg, "/pick <path>")?)),
        "upload" => Command::Upload,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            return Err(SessionError::validation(format!(
                "Unknown command '/{}'. Type /help for the list of commands.",
                other
            )))
        }
    };
    Ok(Some(command))
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, SessionError> {
    let arg = arg.trim();
    if arg.is_empty() {
        Err(usage_error(usage))
    } else {
        Ok(arg)
    }
}

fn usage_error(usage: &str) -> SessionError {
    SessionError::validation(format!("Usage: {}", usage))
}
