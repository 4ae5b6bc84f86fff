//! Module `commands`
//!
//! Data structures for request lines: the raw verb/argument split produced by
//! the parser, and the recognized commands it can be dispatched as.

use crate::error::ProtocolError;
use crate::storage::DirectoryEntry;

/// A single parsed input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    /// Empty line: the client is done.
    Terminate,
    Request(Request),
}

/// A request line split into its verb and positional arguments.
#[derive(Debug, PartialEq, Eq)]
pub struct Request {
    pub verb: String,
    pub args: Vec<String>,
}

/// Commands understood by the server.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// List every entry of the served root
    List,
    /// List entries whose path contains the given substring
    Find(String),
}

impl TryFrom<&Request> for Command {
    type Error = ProtocolError;

    /// Matches the verb case-insensitively. FIND consumes only its first argument.
    fn try_from(request: &Request) -> Result<Self, Self::Error> {
        match request.verb.to_ascii_uppercase().as_str() {
            "LIST" => Ok(Command::List),
            "FIND" => request
                .args
                .first()
                .map(|needle| Command::Find(needle.clone()))
                .ok_or(ProtocolError::MissingArgument("FIND")),
            _ => Err(ProtocolError::UnknownCommand(request.verb.clone())),
        }
    }
}

/// Outcome of dispatching one request.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Entries to write back, one per line
    Entries(Vec<DirectoryEntry>),
    /// Malformed or unknown request; nothing is written back
    Rejected(ProtocolError),
}
