//! JFiles Server - Entry Point
//!
//! A minimal line-oriented file browsing server: clients send LIST or FIND
//! and receive the matching entries of the server's working directory.

use log::{error, info};
use std::process;

use jfiles_server::utils::logging::setup_logging;
use jfiles_server::{ConfigResolver, Server};

#[tokio::main]
async fn main() {
    setup_logging();

    info!("Launching JFiles server...");

    let config = ConfigResolver::default().resolve();

    let root = match std::env::current_dir() {
        Ok(root) => root,
        Err(e) => {
            error!("Cannot determine working directory: {}", e);
            process::exit(1);
        }
    };

    let server = match Server::new(config, root).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            handle.shutdown();
        }
    });

    server.start().await;
}
