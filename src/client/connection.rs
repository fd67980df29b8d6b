//! TCP connection to the trajectory server.
//!
//! There is no auto-start and no retry: a refused connection is reported to
//! the caller, who decides what to show.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::client::ClientResult;
use crate::ipc::{IpcCommand, IpcResponse};

/// Error types for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server could not be reached.
    #[error("cannot connect to {addr}: {source}")]
    ConnectionFailed {
        /// Address we tried.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the socket failed after connecting.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection before answering.
    #[error("server closed the connection")]
    Closed,

    /// The server answered with something that is not an [`IpcResponse`].
    #[error("invalid response from server: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The server answered `ok: false`.
    #[error("{0}")]
    Rejected(String),
}

/// A connected client speaking JSON Lines.
#[derive(Debug)]
pub struct Client {
    stream: BufReader<TcpStream>,
}

impl Client {
    /// Connects to the server at `addr` (`host:port`).
    pub async fn connect(addr: &str) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::ConnectionFailed {
                addr: addr.to_string(),
                source,
            })?;
        tracing::debug!("Connected to trajectory server at {}", addr);
        Ok(Self {
            stream: BufReader::new(stream),
        })
    }

    /// Sends one command and waits for its response line.
    ///
    /// An `ok: false` response is returned as-is; use [`send_command`] to turn
    /// it into [`ClientError::Rejected`].
    pub async fn request(&mut self, cmd: &IpcCommand) -> ClientResult<IpcResponse> {
        self.stream
            .get_mut()
            .write_all(cmd.to_json_line().as_bytes())
            .await?;
        self.stream.get_mut().flush().await?;

        let line = self.read_line().await?.ok_or(ClientError::Closed)?;
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Reads the next line. `None` when the server closed the connection.
    pub async fn read_line(&mut self) -> ClientResult<Option<String>> {
        let mut line = String::new();
        let bytes = self.stream.read_line(&mut line).await?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Connects, sends one command and returns the successful response.
pub async fn send_command(addr: &str, cmd: &IpcCommand) -> ClientResult<IpcResponse> {
    let mut client = Client::connect(addr).await?;
    let response = client.request(cmd).await?;
    if !response.ok {
        return Err(ClientError::Rejected(
            response
                .error
                .unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(response)
}
