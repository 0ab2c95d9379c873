use padlink_core::{ChatMessage, EndpointId};
use serde_json::Value;

/// Inputs to the orchestrator from the signaling side.
#[derive(Debug, Clone)]
pub enum HostCommand {
    /// A member joined the room; a link to it should be negotiated.
    ClientJoined { member_id: EndpointId, name: String },

    ClientLeft { member_id: EndpointId },

    /// Host-initiated removal.
    Kick { member_id: EndpointId },

    Answer { member_id: EndpointId, payload: Value },

    IceCandidate { member_id: EndpointId, payload: Value },

    Chat(ChatMessage),

    /// Close every link and stop the loop.
    Shutdown,
}
