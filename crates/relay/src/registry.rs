use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use webpilot_core::{Error, Result, StreamEvent};

pub type ConnectionId = Uuid;

/// The set of currently attached streaming connections. Each entry holds the
/// sending half of that connection's outbound event queue; the connection
/// task drains the other half onto the wire.
///
/// All mutation goes through the inner mutex, so add/remove/broadcast are
/// serialized against concurrent callers. Removal is idempotent.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<StreamEvent>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub async fn add(&self, sender: mpsc::UnboundedSender<StreamEvent>) -> ConnectionId {
        let id = Uuid::new_v4();
        self.connections.lock().await.insert(id, sender);
        debug!(connection_id = %id, "Connection registered");
        id
    }

    /// Returns false when the connection was already gone.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        let removed = self.connections.lock().await.remove(&id).is_some();
        if removed {
            debug!(connection_id = %id, "Connection removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    /// Send one event to one connection. A dead queue means the client is
    /// gone: the entry is dropped and an error returned.
    pub async fn send_to(&self, id: ConnectionId, event: StreamEvent) -> Result<()> {
        let mut connections = self.connections.lock().await;
        let sender = connections
            .get(&id)
            .ok_or_else(|| Error::Connection(format!("Unknown connection {}", id)))?;
        if sender.send(event).is_err() {
            connections.remove(&id);
            return Err(Error::Connection(format!("Connection {} is closed", id)));
        }
        Ok(())
    }

    /// Fan one event out to every connection. Sends are attempted against a
    /// snapshot; failed connections are collected and removed after the
    /// iteration so one dead client never blocks delivery to the rest.
    /// Returns the number of successful deliveries.
    pub async fn broadcast(&self, event: StreamEvent) -> usize {
        let snapshot: Vec<(ConnectionId, mpsc::UnboundedSender<StreamEvent>)> = {
            let connections = self.connections.lock().await;
            connections
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, sender) in snapshot {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                failed.push(id);
            }
        }

        if !failed.is_empty() {
            let mut connections = self.connections.lock().await;
            for id in failed {
                warn!(connection_id = %id, "Dropping dead connection during broadcast");
                connections.remove(&id);
            }
        }
        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
