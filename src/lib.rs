pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod utils;

pub use server::{ConfigResolver, Configuration, Server, ServerHandle};
