//! Line protocol implementation
//!
//! Handles request parsing, command classification, and dispatch.

pub mod commands;
pub mod handlers;
pub mod parser;

pub use commands::{Command, CommandResult, Line, Request};
pub use handlers::handle_command;
pub use parser::parse_command;
