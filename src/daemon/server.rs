//! TCP server for the trajectory protocol.
//!
//! Clients speak JSON Lines: one [`IpcCommand`] per line, answered by one
//! [`IpcResponse`] line. A `SUB` command turns the connection into a push
//! stream of `drill_state` messages.
//!
//! # Example
//!
//! ```no_run
//! use drillview::daemon::TrajectoryServer;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!     let mut server = TrajectoryServer::new("127.0.0.1:8000".to_string());
//!     server.start().await?;
//!     server.run_with_shutdown(shutdown_rx).await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::daemon::handlers::{
    handle_get_command, handle_status_command, handle_sub_command, handle_update_command,
    DaemonState,
};
use crate::daemon::store::DrillStore;
use crate::daemon::DaemonResult;
use crate::ipc::{IpcCommand, IpcCommandKind, IpcResponse};

/// Longest command line accepted, newline included. Longer lines close the
/// connection.
pub const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// TCP server holding the drill state.
pub struct TrajectoryServer {
    /// Address to bind, `host:port`.
    listen_addr: String,
    /// The listener, set after `start()` is called.
    listener: Option<TcpListener>,
    store: DrillStore,
    /// Timestamp when the server was created (for uptime calculation).
    start_time: Instant,
    /// Count of currently active client connections.
    active_connections: Arc<AtomicUsize>,
}

impl TrajectoryServer {
    /// Creates a server for `listen_addr`. Nothing is bound until `start()`.
    pub fn new(listen_addr: String) -> Self {
        tracing::debug!("Creating TrajectoryServer for {}", listen_addr);
        Self {
            listen_addr,
            listener: None,
            store: DrillStore::new(),
            start_time: Instant::now(),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the configured listen address.
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Returns the bound address once started. Useful with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Returns a handle to the drill state.
    pub fn store(&self) -> DrillStore {
        self.store.clone()
    }

    /// Returns the count of active connections.
    pub fn active_connection_count(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is in use or cannot be resolved.
    pub async fn start(&mut self) -> DaemonResult<()> {
        tracing::info!("Binding to {}", self.listen_addr);
        let listener = TcpListener::bind(&self.listen_addr).await?;
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Trajectory server listening on {}", addr);
        }
        self.listener = Some(listener);
        Ok(())
    }

    /// Runs the accept loop until a shutdown signal is received.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `start()`.
    pub async fn run_with_shutdown(
        &self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> DaemonResult<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or("server not started, call start() first")?;

        let daemon_state = DaemonState {
            store: self.store.clone(),
            start_time: self.start_time,
            active_connections: Arc::clone(&self.active_connections),
            listen_addr: self
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|| self.listen_addr.clone()),
        };

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            tracing::debug!(%peer, "Accepted new client connection");
                            let state = daemon_state.clone();
                            tokio::spawn(async move {
                                state.active_connections.fetch_add(1, Ordering::Relaxed);
                                let result = handle_client(stream, &state).await;
                                state.active_connections.fetch_sub(1, Ordering::Relaxed);
                                if let Err(e) = result {
                                    tracing::warn!("Client handler error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Handles a single client connection until it closes or subscribes.
///
/// Malformed lines get an error response; the connection stays open.
async fn handle_client(stream: TcpStream, state: &DaemonState) -> DaemonResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        match read_bounded_line(&mut reader, &mut line, MAX_LINE_BYTES).await? {
            LineRead::Eof => {
                tracing::debug!("Client disconnected");
                break;
            }
            LineRead::TooLong => {
                tracing::warn!("Closing client: line exceeds {} bytes", MAX_LINE_BYTES);
                let response = IpcResponse::error(format!(
                    "line too long (limit {} bytes)",
                    MAX_LINE_BYTES
                ));
                writer.write_all(response.to_json_line().as_bytes()).await?;
                writer.flush().await?;
                break;
            }
            LineRead::Line => {}
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match parse_command(trimmed) {
            Ok((IpcCommandKind::Update, cmd)) => handle_update_command(&cmd, &state.store).await,
            Ok((IpcCommandKind::Get, _)) => handle_get_command(&state.store).await,
            Ok((IpcCommandKind::Status, _)) => handle_status_command(state).await,
            Ok((IpcCommandKind::Sub, _)) => {
                handle_sub_command(&state.store, &mut writer).await?;
                break;
            }
            Err(message) => {
                tracing::debug!("Rejected command: {}", message);
                IpcResponse::error(message).to_json_line()
            }
        };

        writer.write_all(response.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    Line,
    TooLong,
}

/// Reads one line into `line` (cleared first), reading at most `limit` bytes.
///
/// A final line without a newline still counts as a line.
async fn read_bounded_line<R>(
    reader: &mut R,
    line: &mut String,
    limit: usize,
) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let limit = u64::try_from(limit).unwrap_or(u64::MAX);
    let bytes_read = reader.take(limit).read_line(line).await?;
    if bytes_read == 0 {
        Ok(LineRead::Eof)
    } else if !line.ends_with('\n') && bytes_read as u64 >= limit {
        Ok(LineRead::TooLong)
    } else {
        Ok(LineRead::Line)
    }
}

fn parse_command(line: &str) -> Result<(IpcCommandKind, IpcCommand), String> {
    let cmd: IpcCommand =
        serde_json::from_str(line).map_err(|e| format!("invalid command: {}", e))?;
    let kind = cmd.kind().map_err(|e| e.to_string())?;
    Ok((kind, cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_accepts_known_verbs() {
        let (kind, _) = parse_command(r#"{"version":1,"cmd":"get"}"#).unwrap();
        assert_eq!(kind, IpcCommandKind::Get);
        let (kind, cmd) =
            parse_command(r#"{"version":1,"cmd":"UPDATE","bit":[50.0,25.0]}"#).unwrap();
        assert_eq!(kind, IpcCommandKind::Update);
        assert_eq!(cmd.bit.map(|b| b.height), Some(0.0));
    }

    #[test]
    fn test_parse_command_rejects_bad_input() {
        assert!(parse_command("GET").unwrap_err().starts_with("invalid command"));
        assert!(parse_command(r#"{"version":1,"cmd":"DROP"}"#)
            .unwrap_err()
            .contains("unknown command"));
        assert!(parse_command(r#"{"version":2,"cmd":"GET"}"#)
            .unwrap_err()
            .contains("unsupported protocol version"));
    }

    #[tokio::test]
    async fn test_read_bounded_line() {
        let mut input: &[u8] = b"{\"cmd\":\"GET\"}\nshort\n0123456789abcdef\ntail";
        let mut line = String::new();
        assert_eq!(
            read_bounded_line(&mut input, &mut line, 16).await.unwrap(),
            LineRead::Line
        );
        assert_eq!(line, "{\"cmd\":\"GET\"}\n");
        assert_eq!(
            read_bounded_line(&mut input, &mut line, 16).await.unwrap(),
            LineRead::Line
        );
        assert_eq!(line, "short\n");
        // 16 bytes with no newline yet: too long.
        assert_eq!(
            read_bounded_line(&mut input, &mut line, 16).await.unwrap(),
            LineRead::TooLong
        );
        assert_eq!(line.len(), 16);
    }

    #[tokio::test]
    async fn test_read_bounded_line_final_line_and_eof() {
        let mut input: &[u8] = b"tail";
        let mut line = String::new();
        assert_eq!(
            read_bounded_line(&mut input, &mut line, 16).await.unwrap(),
            LineRead::Line
        );
        assert_eq!(line, "tail");
        assert_eq!(
            read_bounded_line(&mut input, &mut line, 16).await.unwrap(),
            LineRead::Eof
        );
    }

    #[tokio::test]
    async fn test_start_binds_ephemeral_port() {
        let mut server = TrajectoryServer::new("127.0.0.1:0".to_string());
        assert!(server.local_addr().is_none());
        server.start().await.expect("bind");
        let addr = server.local_addr().expect("bound address");
        assert_ne!(addr.port(), 0);
        assert_eq!(server.active_connection_count(), 0);
    }

    #[tokio::test]
    async fn test_run_before_start_is_error() {
        let server = TrajectoryServer::new("127.0.0.1:0".to_string());
        let (_tx, rx) = broadcast::channel(1);
        assert!(server.run_with_shutdown(rx).await.is_err());
    }
}
