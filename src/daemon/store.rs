//! In-memory drill state shared by all client connections.
//!
//! The store wraps the current [`DrillSnapshot`] in `Arc<RwLock>` and carries
//! a broadcast channel; every accepted update is published to subscribers as
//! the full new state.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::geo::Position;
use crate::ipc::DrillState;


/// Default capacity for the subscriber notification channel.
const DEFAULT_SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// Full server-side drill state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrillSnapshot {
    /// Latest bit position, `None` until the first update names one.
    pub bit: Option<Position>,
    /// Latest non-empty trajectory.
    pub path: Vec<Position>,
    /// Measured depth in metres.
    pub md: f64,
}

impl DrillSnapshot {
    /// Wire payload carrying every field.
    pub fn to_payload(&self) -> DrillState {
        DrillState {
            bit: self.bit,
            path: Some(self.path.clone()),
            md: Some(self.md),
        }
    }

    /// Merges a partial update: `bit` and `md` replace when present, `path`
    /// replaces when present and non-empty.
    pub fn merge(&mut self, update: DrillState) {
        if let Some(bit) = update.bit {
            self.bit = Some(bit);
        }
        if let Some(md) = update.md {
            self.md = md;
        }
        if let Some(path) = update.path.filter(|p| !p.is_empty()) {
            self.path = path;
        }
    }
}

/// Thread-safe drill state with change notifications.
#[derive(Clone)]
pub struct DrillStore {
    state: Arc<RwLock<DrillSnapshot>>,
    update_tx: broadcast::Sender<DrillSnapshot>,
}

impl std::fmt::Debug for DrillStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrillStore")
            .field("state", &self.state)
            .field("subscriber_count", &self.update_tx.receiver_count())
            .finish()
    }
}

impl Default for DrillStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillStore {
    /// Creates a store holding the empty state.
    pub fn new() -> Self {
        let (update_tx, _rx) = broadcast::channel(DEFAULT_SUBSCRIBER_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(DrillSnapshot::default())),
            update_tx,
        }
    }

    /// Subscribes to state changes. Each message is the full state after an
    /// update.
    pub fn subscribe(&self) -> broadcast::Receiver<DrillSnapshot> {
        self.update_tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.update_tx.receiver_count()
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> DrillSnapshot {
        self.state.read().await.clone()
    }

    /// Applies a partial update, broadcasts the result and returns it.
    pub async fn update(&self, update: DrillState) -> DrillSnapshot {
        let snapshot = {
            let mut state = self.state.write().await;
            state.merge(update);
            state.clone()
        };
        self.broadcast(&snapshot);
        snapshot
    }

    fn broadcast(&self, snapshot: &DrillSnapshot) {
        match self.update_tx.send(snapshot.clone()) {
            Ok(count) => tracing::trace!(
                path_points = snapshot.path.len(),
                md = snapshot.md,
                subscribers = count,
                "drill state broadcast"
            ),
            Err(_) => tracing::debug!("drill state updated with no subscribers"),
        }
    }
}
