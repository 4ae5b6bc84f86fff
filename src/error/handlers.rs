//! Error handlers
//!
//! Reports errors to the server log at the level matching their recovery policy.

use crate::error::types::FileServerError;
use log::{Level, log};

/// Log level for an error: recoverable conditions are warnings.
pub fn error_level(err: &FileServerError) -> Level {
    match err {
        FileServerError::Config(_) => Level::Warn,
        FileServerError::Protocol(_) => Level::Warn,
        FileServerError::Listener(_) => Level::Error,
        FileServerError::Storage(_) => Level::Error,
        FileServerError::Session(_) => Level::Error,
    }
}

/// Handle a file server error that occurred in `context`
pub fn handle_error(context: &str, err: impl Into<FileServerError>) {
    let err = err.into();
    log!(error_level(&err), "{}: {}", context, err);
}
