use crate::model::chat::ChatMessage;
use crate::model::peer::EndpointId;
use crate::model::room::RoomCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Body of `GET /api/ice`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceServersResponse {
    pub ice_servers: Vec<IceServerConfig>,
}

/// Public STUN servers used when nothing better is configured or reachable.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig::stun("stun:stun.l.google.com:19302"),
        IceServerConfig::stun("stun:stun1.l.google.com:19302"),
    ]
}

/// The three payload kinds the relay forwards without looking inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// An opaque signaling payload plus its routing keys.
///
/// `target` wins over `room_id` when both are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EndpointId>,
}

impl Signal {
    pub fn to_target(target: EndpointId, room_id: Option<RoomCode>, payload: Value) -> Self {
        Self {
            payload,
            room_id,
            target: Some(target),
        }
    }

    pub fn to_room(room_id: RoomCode, payload: Value) -> Self {
        Self {
            payload,
            room_id: Some(room_id),
            target: None,
        }
    }
}

/// A forwarded signaling payload, tagged with who sent it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relayed {
    pub payload: Value,
    pub sender: EndpointId,
}

/// Messages an endpoint sends to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    CreateRoom {
        room_id: RoomCode,
    },
    JoinRoom {
        room_id: RoomCode,
        user_name: String,
    },
    KickClient {
        member_id: EndpointId,
        room_id: RoomCode,
    },
    Offer(Signal),
    Answer(Signal),
    IceCandidate(Signal),
    ChatMessage {
        room_id: RoomCode,
        text: String,
        sender_name: String,
    },
    ClientLog {
        message: String,
    },
}

impl ClientMessage {
    pub fn signal(kind: SignalKind, signal: Signal) -> Self {
        match kind {
            SignalKind::Offer => Self::Offer(signal),
            SignalKind::Answer => Self::Answer(signal),
            SignalKind::IceCandidate => Self::IceCandidate(signal),
        }
    }
}

/// Messages the relay sends to an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Welcome {
        endpoint_id: EndpointId,
    },
    RoomCreated {
        room_id: RoomCode,
    },
    RoomJoined {
        room_id: RoomCode,
    },
    ClientJoined {
        member_id: EndpointId,
        name: String,
    },
    ClientLeft {
        member_id: EndpointId,
    },
    Kicked {
        room_id: RoomCode,
    },
    Offer(Relayed),
    Answer(Relayed),
    IceCandidate(Relayed),
    ChatMessage(ChatMessage),
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn relayed(kind: SignalKind, sender: EndpointId, payload: Value) -> Self {
        let relayed = Relayed { payload, sender };
        match kind {
            SignalKind::Offer => Self::Offer(relayed),
            SignalKind::Answer => Self::Answer(relayed),
            SignalKind::IceCandidate => Self::IceCandidate(relayed),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
