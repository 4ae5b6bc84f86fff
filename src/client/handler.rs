use log::info;
use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};

use crate::client::SessionSettings;
use crate::error::{ProtocolError, SessionError, handle_error};
use crate::protocol::{CommandResult, Line, handle_command, parse_command};
use crate::storage::DirectoryEntry;

/// One read from the client
#[derive(Debug, PartialEq, Eq)]
enum Incoming {
    Eof,
    Line(String),
    /// Line exceeded the limit and was discarded up to its terminator
    TooLong(usize),
}

/// Handles one client session until it ends.
///
/// - Reads request lines from the client with a BufReader.
/// - Dispatches each request with `handle_command` against `root`.
/// - Writes one path per line for LIST/FIND, nothing for rejected requests.
///
/// The session ends on an empty line, end of stream, idle timeout, a client
/// that stops draining responses, or any I/O error. The stream is dropped,
/// and so closed, on every path.
pub async fn handle_client<S>(stream: S, peer: &str, root: &Path, settings: &SessionSettings)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("Received connection from {}", peer);

    match run_session(stream, peer, root, settings).await {
        Ok(()) => info!("Client {} disconnected", peer),
        Err(e) => handle_error(&format!("Session with {} ended", peer), e),
    }
}

async fn run_session<S>(
    stream: S,
    peer: &str,
    root: &Path,
    settings: &SessionSettings,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    loop {
        let incoming = with_deadline(
            settings.idle_timeout,
            SessionError::IdleTimeout,
            read_request(&mut reader, settings.max_command_length),
        )
        .await?;

        let line = match incoming {
            Incoming::Eof => {
                info!("Connection closed by client {}", peer);
                return Ok(());
            }
            Incoming::TooLong(len) => {
                handle_error(peer, ProtocolError::CommandTooLong(len));
                continue;
            }
            Incoming::Line(line) => line,
        };

        let raw = line.strip_suffix('\n').unwrap_or(&line);
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        // Enforce command length limit
        if raw.len() > settings.max_command_length {
            handle_error(peer, ProtocolError::CommandTooLong(raw.len()));
            continue;
        }

        let request = match parse_command(raw) {
            Line::Terminate => {
                info!("Client {} ended the session", peer);
                writer.shutdown().await?;
                return Ok(());
            }
            Line::Request(request) => request,
        };
        info!("Received from {}: {:?}", peer, request);

        let entries = match handle_command(&request, root).await? {
            CommandResult::Entries(entries) => entries,
            CommandResult::Rejected(e) => {
                handle_error(peer, e);
                Vec::new()
            }
        };
        with_deadline(
            settings.idle_timeout,
            SessionError::WriteTimeout,
            send_entries(&mut writer, &entries),
        )
        .await?;
    }
}

/// Runs an I/O step, failing with `on_expiry` if it outlasts `limit`.
async fn with_deadline<T, F>(
    limit: Option<Duration>,
    on_expiry: fn(Duration) -> SessionError,
    step: F,
) -> Result<T, SessionError>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, step)
            .await
            .map_err(|_| on_expiry(limit))?
            .map_err(SessionError::from),
        None => Ok(step.await?),
    }
}

/// Reads one line of at most `max_len` bytes plus its terminator.
///
/// Longer lines are consumed and dropped without being buffered, so a client
/// cannot grow the session's memory by withholding the newline.
async fn read_request<R>(reader: &mut R, max_len: usize) -> io::Result<Incoming>
where
    R: AsyncBufRead + Unpin,
{
    let cap = max_len.saturating_add(2);
    let mut buf = Vec::new();
    let mut seen = 0usize;
    let mut overflowed = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if seen == 0 {
                return Ok(Incoming::Eof);
            }
            break;
        }

        let (used, done) = match available.iter().position(|b| *b == b'\n') {
            Some(i) => (i + 1, true),
            None => (available.len(), false),
        };
        if !overflowed {
            if buf.len() + used > cap {
                overflowed = true;
                buf = Vec::new();
            } else {
                buf.extend_from_slice(&available[..used]);
            }
        }
        seen += used;
        reader.consume(used);

        if done {
            break;
        }
    }

    if overflowed {
        return Ok(Incoming::TooLong(seen));
    }
    String::from_utf8(buf)
        .map(Incoming::Line)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Writes one path per line, then flushes.
async fn send_entries<W>(writer: &mut W, entries: &[DirectoryEntry]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for entry in entries {
        writer.write_all(entry.as_line().as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await
}
