//! Command handlers
//!
//! Dispatches a parsed request to the directory lister. Unknown verbs and
//! missing arguments are rejected here rather than at parse time.

use log::debug;
use std::path::Path;

use crate::error::StorageError;
use crate::protocol::{Command, CommandResult, Request};
use crate::storage::{find_entries, list_directory};

/// Dispatches a received request to its corresponding handler.
///
/// # Arguments
///
/// * `request` - The parsed request line.
/// * `root` - The served root directory.
///
/// # Returns
///
/// * `Ok(CommandResult)` - Entries to send, or the protocol error that rejected the request.
/// * `Err(StorageError)` - The root could not be enumerated; the session should end.
pub async fn handle_command(request: &Request, root: &Path) -> Result<CommandResult, StorageError> {
    let command = match Command::try_from(request) {
        Ok(command) => command,
        Err(e) => return Ok(CommandResult::Rejected(e)),
    };

    match command {
        Command::List => handle_cmd_list(root).await,
        Command::Find(needle) => handle_cmd_find(root, &needle).await,
    }
}

async fn handle_cmd_list(root: &Path) -> Result<CommandResult, StorageError> {
    let entries = list_directory(root).await?;
    debug!("LIST {} -> {} entries", root.display(), entries.len());
    Ok(CommandResult::Entries(entries))
}

async fn handle_cmd_find(root: &Path, needle: &str) -> Result<CommandResult, StorageError> {
    let entries = find_entries(root, needle).await?;
    debug!("FIND {:?} in {} -> {} entries", needle, root.display(), entries.len());
    Ok(CommandResult::Entries(entries))
}
