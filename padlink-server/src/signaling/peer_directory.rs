use dashmap::DashMap;
use padlink_core::{EndpointId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outbound queues of every endpoint currently connected to the relay.
///
/// Queues are unbounded so delivery never awaits; a handler can enqueue while
/// holding a room lock.
#[derive(Clone, Default)]
pub struct PeerDirectory {
    peers: Arc<DashMap<EndpointId, mpsc::UnboundedSender<ServerMessage>>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&self, id: EndpointId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.peers.insert(id, tx);
    }

    pub fn remove_peer(&self, id: &EndpointId) -> bool {
        self.peers.remove(id).is_some()
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.peers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Best-effort delivery. Unknown or closed endpoints are dropped silently.
    pub fn deliver(&self, to: &EndpointId, msg: ServerMessage) -> bool {
        let Some(peer) = self.peers.get(to) else {
            debug!("Dropping message for unknown endpoint {}", to);
            return false;
        };
        if peer.send(msg).is_err() {
            warn!("Outbound queue of {} is closed", to);
            return false;
        }
        true
    }
}
