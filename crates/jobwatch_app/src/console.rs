//! Line commands accepted on stdin while `jobwatch watch` runs.

use jobwatch_core::Msg;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Manual check; `None` uses the configured query.
    Check(Option<String>),
    Delete(String),
    /// Flip a job card between expanded and collapsed.
    Toggle(String),
    ClearCollapsed,
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}; try check, delete, expand, clear-collapsed, status or quit")]
    Unknown(String),
    #[error("{0} needs a job id")]
    MissingId(&'static str),
}

impl ConsoleCommand {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "check" | "refresh" => {
                ConsoleCommand::Check(Some(rest.to_string()).filter(|q| !q.is_empty()))
            }
            "delete" | "rm" => ConsoleCommand::Delete(required_id(rest, "delete")?),
            "expand" | "collapse" | "toggle" => {
                ConsoleCommand::Toggle(required_id(rest, "expand")?)
            }
            "clear-collapsed" => ConsoleCommand::ClearCollapsed,
            "status" | "list" => ConsoleCommand::Status,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    /// The state-machine message, for commands that change state.
    pub fn into_msg(self) -> Option<Msg> {
        match self {
            ConsoleCommand::Check(query) => Some(Msg::RunCheck { query }),
            ConsoleCommand::Delete(id) => Some(Msg::DeleteJob { id }),
            ConsoleCommand::Toggle(id) => Some(Msg::ToggleCollapsed { id }),
            ConsoleCommand::ClearCollapsed => Some(Msg::ClearCollapsed),
            ConsoleCommand::Status | ConsoleCommand::Quit => None,
        }
    }
}

fn required_id(rest: &str, verb: &'static str) -> Result<String, CommandError> {
    rest.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(CommandError::MissingId(verb))
}
