use async_trait::async_trait;
use padlink_core::EndpointId;
use serde_json::Value;

/// Outgoing signaling from the orchestrator to its members.
#[async_trait]
pub trait SignalingOutput: Send + Sync + 'static {
    async fn send_offer(&self, member: EndpointId, offer: Value);

    async fn send_ice(&self, member: EndpointId, candidate: Value);

    /// Asks the relay to remove `member` from the room.
    async fn kick(&self, member: EndpointId);
}
