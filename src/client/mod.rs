//! Client session handling
//!
//! Runs the read-command/write-response loop for one accepted connection.

pub mod handler;
pub mod session;

pub use handler::handle_client;
pub use session::SessionSettings;
