//! Client session settings
//!
//! Limits applied to each connection's read-command/write-response loop.

use std::time::Duration;

use crate::server::config::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_COMMAND_LENGTH};

/// Per-session limits derived from the server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// How long to wait for the next request line; `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Request lines longer than this many bytes are rejected.
    pub max_command_length: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)),
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
        }
    }
}
