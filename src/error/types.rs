//! Error types
//!
//! Defines domain-specific error types for each module of the file server.
//! Each kind carries its own recovery policy: configuration and protocol
//! errors are recovered where they occur, storage and session errors end
//! the session, and bind errors end the process.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Settings source errors. Never surfaced past the resolver.
#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, config::ConfigError),
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(path, e) => {
                write!(f, "Failed to read settings from {}: {}", path.display(), e)
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: {}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(_, e) => Some(e),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Listening socket errors
#[derive(Debug)]
pub enum ListenerError {
    Bind { addr: String, source: io::Error },
    Accept(io::Error),
    Closed,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Bind { addr, source } => {
                write!(f, "Failed to bind to {}: {}", addr, source)
            }
            ListenerError::Accept(e) => write!(f, "Failed to accept connection: {}", e),
            ListenerError::Closed => write!(f, "Listener has been shut down"),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::Accept(e) => Some(e),
            ListenerError::Closed => None,
        }
    }
}

/// Malformed or unsupported input on a single request line
#[derive(Debug, PartialEq, Eq)]
pub enum ProtocolError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    CommandTooLong(usize),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownCommand(verb) => write!(f, "Unknown command: {:?}", verb),
            ProtocolError::MissingArgument(verb) => {
                write!(f, "Missing required argument for {}", verb)
            }
            ProtocolError::CommandTooLong(len) => write!(f, "Command too long: {} bytes", len),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Directory enumeration errors
#[derive(Debug)]
pub enum StorageError {
    DirectoryUnreadable { path: PathBuf, source: io::Error },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DirectoryUnreadable { path, source } => {
                write!(f, "Cannot read directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::DirectoryUnreadable { source, .. } => Some(source),
        }
    }
}

/// Conditions that end a client session
#[derive(Debug)]
pub enum SessionError {
    Io(io::Error),
    Storage(StorageError),
    IdleTimeout(Duration),
    WriteTimeout(Duration),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "I/O error: {}", e),
            SessionError::Storage(e) => write!(f, "Storage error: {}", e),
            SessionError::IdleTimeout(after) => {
                write!(f, "No command received within {}s", after.as_secs_f64())
            }
            SessionError::WriteTimeout(after) => {
                write!(f, "Client did not accept response within {}s", after.as_secs_f64())
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(e) => Some(e),
            SessionError::Storage(e) => Some(e),
            SessionError::IdleTimeout(_) | SessionError::WriteTimeout(_) => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        SessionError::Io(error)
    }
}

impl From<StorageError> for SessionError {
    fn from(error: StorageError) -> Self {
        SessionError::Storage(error)
    }
}

/// General file server error that encompasses all error types
#[derive(Debug)]
pub enum FileServerError {
    Config(ConfigError),
    Listener(ListenerError),
    Protocol(ProtocolError),
    Storage(StorageError),
    Session(SessionError),
}

impl fmt::Display for FileServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileServerError::Config(e) => write!(f, "Configuration error: {}", e),
            FileServerError::Listener(e) => write!(f, "Listener error: {}", e),
            FileServerError::Protocol(e) => write!(f, "Protocol error: {}", e),
            FileServerError::Storage(e) => write!(f, "Storage error: {}", e),
            FileServerError::Session(e) => write!(f, "Session error: {}", e),
        }
    }
}

impl std::error::Error for FileServerError {}

impl From<ConfigError> for FileServerError {
    fn from(error: ConfigError) -> Self {
        FileServerError::Config(error)
    }
}

impl From<ListenerError> for FileServerError {
    fn from(error: ListenerError) -> Self {
        FileServerError::Listener(error)
    }
}

impl From<ProtocolError> for FileServerError {
    fn from(error: ProtocolError) -> Self {
        FileServerError::Protocol(error)
    }
}

impl From<StorageError> for FileServerError {
    fn from(error: StorageError) -> Self {
        FileServerError::Storage(error)
    }
}

impl From<SessionError> for FileServerError {
    fn from(error: SessionError) -> Self {
        FileServerError::Session(error)
    }
}
