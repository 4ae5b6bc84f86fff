use log::{error, info};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::client::{SessionSettings, handle_client};
use crate::error::ListenerError;
use crate::server::config::Configuration;
use crate::server::listener::{ServerListener, ShutdownHandle};

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(50);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

pub struct Server {
    listener: ServerListener,
    config: Arc<Configuration>,
    root: Arc<PathBuf>,
    permits: Arc<Semaphore>,
}

/// Stops a running server's accept loop.
#[derive(Clone)]
pub struct ServerHandle {
    listener: ShutdownHandle,
    permits: Arc<Semaphore>,
}

impl ServerHandle {
    /// Stops accepting new clients. Sessions already running finish on their own.
    pub fn shutdown(&self) {
        info!("Shutting down listener");
        self.listener.shutdown();
        self.permits.close();
    }
}

impl Server {
    /// Binds the listening socket using the resolved configuration.
    /// `root` is the directory every session serves.
    pub async fn new(config: Configuration, root: PathBuf) -> Result<Self, ListenerError> {
        let listener = ServerListener::bind(&config.bind_socket()).await?;
        info!("Serving directory: {}", root.display());

        Ok(Self {
            listener,
            permits: Arc::new(Semaphore::new(config.max_threads)),
            config: Arc::new(config),
            root: Arc::new(root),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            listener: self.listener.shutdown_handle(),
            permits: Arc::clone(&self.permits),
        }
    }

    /// Accepts clients until shut down, running each session in its own task.
    ///
    /// A permit is taken before each accept and held by the session, so at
    /// most `max_threads` sessions run at once; later clients wait in the
    /// socket backlog until a session ends.
    pub async fn start(mut self) {
        info!(
            "Starting JFiles server on {} (max {} clients)",
            self.config.bind_socket(),
            self.config.max_threads
        );
        let settings: SessionSettings = self.config.session_settings();
        let mut failures: u32 = 0;

        loop {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            match self.listener.accept().await {
                Ok(connection) => {
                    failures = 0;
                    let root = Arc::clone(&self.root);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        let (stream, addr) = connection.into_parts();
                        handle_client(stream, &addr.to_string(), &root, &settings).await;
                        drop(permit);
                    });
                }
                Err(ListenerError::Closed) => break,
                Err(e) => {
                    // e.g. EMFILE: retrying at once would spin until a descriptor frees up
                    failures = failures.saturating_add(1);
                    let pause = accept_backoff(failures);
                    error!("Error accepting connection: {} (retrying in {:?})", e, pause);
                    tokio::time::sleep(pause).await;
                }
            }
        }

        info!("Server stopped accepting connections");
    }
}

/// Delay before retrying after `failures` consecutive accept errors.
fn accept_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    ACCEPT_BACKOFF_MIN
        .saturating_mul(1 << exponent)
        .min(ACCEPT_BACKOFF_MAX)
}
