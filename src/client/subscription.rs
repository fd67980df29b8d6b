//! Live subscription for the viewer.
//!
//! Connects, sends `SUB`, and forwards every pushed line as a
//! [`ViewerEvent::Message`]. Socket lifecycle changes become events too, so
//! the viewer can reflect them in its status text.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::{Client, ClientError};
use crate::ipc::{IpcCommand, IpcCommandKind};

/// Socket events delivered to the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The subscription is open.
    Connected,
    /// One line pushed by the server, not yet parsed.
    Message(String),
    /// The server closed the connection.
    Disconnected,
    /// The connection broke after it was open.
    Error(String),
    /// The connection could not be opened.
    ConnectFailed(String),
}

/// Runs one subscription until the server goes away or the receiver is
/// dropped. Never retries.
pub async fn run_subscription(addr: String, tx: mpsc::Sender<ViewerEvent>) {
    let mut client = match open(&addr).await {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("subscription to {} failed: {}", addr, e);
            let _ = tx.send(ViewerEvent::ConnectFailed(e.to_string())).await;
            return;
        }
    };

    if tx.send(ViewerEvent::Connected).await.is_err() {
        return;
    }
    tracing::info!("subscribed to {}", addr);

    loop {
        let event = match client.read_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                ViewerEvent::Message(trimmed.to_string())
            }
            Ok(None) => {
                tracing::info!("server closed subscription");
                let _ = tx.send(ViewerEvent::Disconnected).await;
                return;
            }
            Err(e) => {
                tracing::warn!("subscription error: {}", e);
                let _ = tx.send(ViewerEvent::Error(e.to_string())).await;
                return;
            }
        };
        if tx.send(event).await.is_err() {
            // receiver dropped
            return;
        }
    }
}

/// Connects and sends SUB, returning the client once the server acknowledged.
async fn open(addr: &str) -> Result<Client, ClientError> {
    let mut client = Client::connect(addr).await?;
    let ack = client.request(&IpcCommand::new(IpcCommandKind::Sub)).await?;
    if !ack.ok {
        return Err(ClientError::Rejected(
            ack.error.unwrap_or_else(|| "subscription refused".to_string()),
        ));
    }
    Ok(client)
}

/// Spawns [`run_subscription`] on the current runtime.
pub fn spawn_subscription(addr: String, tx: mpsc::Sender<ViewerEvent>) -> JoinHandle<()> {
    tokio::spawn(run_subscription(addr, tx))
}
