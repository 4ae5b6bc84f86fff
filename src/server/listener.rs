//! Listening socket
//!
//! Owns the bound TCP listener and hands out accepted connections until it
//! is shut down.

use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::error::ListenerError;

/// One accepted client connection
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn into_parts(self) -> (TcpStream, SocketAddr) {
        (self.stream, self.peer)
    }
}

/// Closes a `ServerListener` from anywhere, including while it is blocked in `accept`.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

pub struct ServerListener {
    listener: TcpListener,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ServerListener {
    /// Binds the listening socket. Fails if the address is unavailable.
    pub async fn bind(addr: &str) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Server bound to {}", addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            listener,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Waits for the next client. Returns `ListenerError::Closed` once shut down.
    pub async fn accept(&mut self) -> Result<Connection, ListenerError> {
        if *self.shutdown_rx.borrow_and_update() {
            return Err(ListenerError::Closed);
        }

        tokio::select! {
            accepted = self.listener.accept() => {
                let (stream, peer) = accepted.map_err(ListenerError::Accept)?;
                Ok(Connection { stream, peer })
            }
            _ = self.shutdown_rx.changed() => Err(ListenerError::Closed),
        }
    }
}
