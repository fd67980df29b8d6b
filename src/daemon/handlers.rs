//! Command handlers for the trajectory server protocol.
//!
//! Each `handle_*` function processes a single JSON IPC command received from
//! a client connection and returns a JSON Lines response string (or streams
//! data for SUB).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;

use crate::daemon::store::{DrillSnapshot, DrillStore};
use crate::daemon::DaemonResult;
use crate::health::{get_memory_usage_mb, HealthStatus};
use crate::ipc::{DrillState, DrillStateMessage, IpcCommand, IpcResponse};


/// Shared server state passed to each client handler.
#[derive(Clone)]
pub(super) struct DaemonState {
    pub(super) store: DrillStore,
    pub(super) start_time: Instant,
    pub(super) active_connections: Arc<AtomicUsize>,
    pub(super) listen_addr: String,
}

fn state_response(snapshot: &DrillSnapshot) -> String {
    IpcResponse::success(Some(
        serde_json::to_value(snapshot.to_payload()).expect("failed to serialize DrillState"),
    ))
    .to_json_line()
}

/// Handles the UPDATE command.
///
/// Merges the present fields into the stored state, broadcasts the result to
/// subscribers and returns the full state. An UPDATE with no fields changes
/// nothing but still rebroadcasts.
pub(super) async fn handle_update_command(cmd: &IpcCommand, store: &DrillStore) -> String {
    if let Some(md) = cmd.md.filter(|md| !md.is_finite()) {
        return IpcResponse::error(format!("invalid md: {}", md)).to_json_line();
    }
    let mut positions = cmd.bit.iter().chain(cmd.path.iter().flatten());
    if let Some(p) = positions.find(|p| !p.is_valid()) {
        return IpcResponse::error(format!(
            "position out of range: lon={}, lat={}",
            p.lon, p.lat
        ))
        .to_json_line();
    }

    let snapshot = store
        .update(DrillState {
            bit: cmd.bit,
            path: cmd.path.clone(),
            md: cmd.md,
        })
        .await;
    tracing::debug!(
        path_points = snapshot.path.len(),
        md = snapshot.md,
        "drill state updated"
    );
    state_response(&snapshot)
}

/// Handles the GET command. Returns the full state.
pub(super) async fn handle_get_command(store: &DrillStore) -> String {
    state_response(&store.snapshot().await)
}

/// Handles the STATUS command.
pub(super) async fn handle_status_command(state: &DaemonState) -> String {
    let snapshot = state.store.snapshot().await;
    let health = HealthStatus {
        uptime_seconds: state.start_time.elapsed().as_secs(),
        connections: state.active_connections.load(Ordering::Relaxed),
        subscribers: state.store.subscriber_count(),
        path_points: snapshot.path.len(),
        md: snapshot.md,
        memory_mb: get_memory_usage_mb(),
        listen_addr: state.listen_addr.clone(),
    };

    IpcResponse::success(Some(
        serde_json::to_value(&health).expect("failed to serialize HealthStatus"),
    ))
    .to_json_line()
}

/// Handles the SUB command.
///
/// Acknowledges, sends the current state as a `drill_state` message, then one
/// message per update until the client goes away. A lagged subscriber skips
/// the backlog and is sent the latest state once.
pub(super) async fn handle_sub_command<W>(store: &DrillStore, writer: &mut W) -> DaemonResult<()>
where
    W: AsyncWrite + Unpin,
{
    let ok_msg = IpcResponse::success(Some(serde_json::json!("subscribed")));
    writer.write_all(ok_msg.to_json_line().as_bytes()).await?;
    writer.flush().await?;

    // Subscribe before reading the snapshot so no update falls in between.
    let mut rx = store.subscribe();
    let initial = store.snapshot().await;
    if write_or_disconnect(writer, &drill_state_line(&initial)).await {
        return Ok(());
    }

    tracing::debug!("Client subscribed to drill state");

    loop {
        let snapshot = match rx.recv().await {
            Ok(snapshot) => snapshot,
            Err(broadcast::error::RecvError::Lagged(count)) => {
                tracing::warn!("Subscriber lagged, missed {} updates", count);
                drain_backlog(&mut rx);
                store.snapshot().await
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Subscriber channel closed");
                break;
            }
        };
        if write_or_disconnect(writer, &drill_state_line(&snapshot)).await {
            break;
        }
    }

    Ok(())
}

/// Discards queued updates; the caller resends the current state instead.
fn drain_backlog(rx: &mut broadcast::Receiver<DrillSnapshot>) {
    let mut skipped = 0usize;
    loop {
        match rx.try_recv() {
            Ok(_) => skipped += 1,
            Err(broadcast::error::TryRecvError::Lagged(n)) => skipped += n as usize,
            Err(_) => break,
        }
    }
    tracing::trace!(skipped, "subscriber backlog dropped");
}

fn drill_state_line(snapshot: &DrillSnapshot) -> String {
    DrillStateMessage::new(snapshot.to_payload()).to_json_line()
}

/// Writes a message to the client. Returns `true` if the client disconnected.
async fn write_or_disconnect<W>(writer: &mut W, message: &str) -> bool
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = writer.write_all(message.as_bytes()).await {
        tracing::debug!("Subscriber disconnected (write failed): {}", e);
        return true;
    }
    if let Err(e) = writer.flush().await {
        tracing::debug!("Subscriber disconnected (flush failed): {}", e);
        return true;
    }
    false
}
