//! Line-oriented presentation: parsing commands and rendering the list.

use crate::types::{AppAction, AppState, TodoAction};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a command line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The line was blank
    #[error("Empty command")]
    Empty,
    /// The first word is not a known command
    #[error("Unknown command {0:?} (try: add, toggle <i>, edit <i> <text>, list, json, quit)")]
    Unknown(String),
    /// The command needs an index
    #[error("{0} needs an item index")]
    MissingIndex(&'static str),
    /// The index is not a non-negative integer
    #[error("Invalid index {0:?}")]
    InvalidIndex(String),
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send an action to the store
    Send(AppAction),
    /// Print the list
    List,
    /// Print the state as JSON
    Json,
    /// Leave the program
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();

        match verb {
            "" => Err(CommandError::Empty),
            "add" => Ok(Self::Send(AppAction::AddButtonTapped)),
            "toggle" => {
                let index = parse_index("toggle", rest)?;
                Ok(Self::Send(AppAction::todo(index, TodoAction::CheckboxTapped)))
            },
            "edit" => {
                let (index, text) = rest
                    .split_once(char::is_whitespace)
                    .unwrap_or((rest, ""));
                let index = parse_index("edit", index)?;
                Ok(Self::Send(AppAction::todo(
                    index,
                    TodoAction::TextFieldChanged(text.trim_start().to_string()),
                )))
            },
            "list" | "ls" => Ok(Self::List),
            "json" => Ok(Self::Json),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_index(verb: &'static str, raw: &str) -> Result<usize, CommandError> {
    if raw.is_empty() {
        return Err(CommandError::MissingIndex(verb));
    }
    raw.parse()
        .map_err(|_| CommandError::InvalidIndex(raw.to_string()))
}

/// Renders the list, one numbered line per item
#[must_use]
pub fn render(state: &AppState) -> String {
    let mut out = String::new();

    for (index, todo) in state.todos.iter().enumerate() {
        let mark = if todo.is_complete { 'x' } else { ' ' };
        let _ = writeln!(out, "{index:>3} [{mark}] {}", todo.description);
    }
    let _ = write!(
        out,
        "{} of {} remaining",
        state.remaining(),
        state.todos.len()
    );

    out
}
