//! Server core functionality
//!
//! This module contains the configuration resolver, the listening socket,
//! and the accept loop that spawns client sessions.

pub mod config;
pub mod core;
pub mod listener;

pub use self::config::{ConfigResolver, Configuration};
pub use self::core::{Server, ServerHandle};
pub use self::listener::{Connection, ServerListener, ShutdownHandle};
