use crate::capture::CaptureLease;
use crate::error::HostError;
use crate::transport::ConnectionWrapper;
use bytes::Bytes;
use padlink_core::EndpointId;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use webrtc::data_channel::RTCDataChannel;
use webrtc::track::track_remote::TrackRemote;

/// Identifies one incarnation of a peer link.
///
/// A member that is kicked and joins again gets a new epoch, so late events
/// from the old connection can be told apart from the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub member: EndpointId,
    pub epoch: u64,
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.member, self.epoch)
    }
}

/// Events produced by peer links and their negotiation tasks for the
/// orchestrator loop.
pub enum TransportEvent {
    /// The offer is built and the local description set. The orchestrator
    /// takes ownership of the connection before the offer goes out.
    OfferReady {
        key: LinkKey,
        transport: ConnectionWrapper,
        lease: CaptureLease,
        offer: Value,
    },

    NegotiationFailed { key: LinkKey, error: HostError },

    /// The connection asked for (re)negotiation.
    NegotiationNeeded(LinkKey),

    /// The control channel is open.
    ChannelOpen(LinkKey, Arc<RTCDataChannel>),

    /// One control frame from the client.
    Control(LinkKey, Bytes),

    /// Media the client sends, i.e. its microphone.
    RemoteTrack(LinkKey, Arc<TrackRemote>),

    /// A local ICE candidate for the client.
    CandidateGenerated(LinkKey, Value),

    Disconnected(LinkKey),
}

impl TransportEvent {
    pub fn key(&self) -> LinkKey {
        match self {
            Self::OfferReady { key, .. } | Self::NegotiationFailed { key, .. } => *key,
            Self::NegotiationNeeded(key)
            | Self::ChannelOpen(key, _)
            | Self::Control(key, _)
            | Self::RemoteTrack(key, _)
            | Self::CandidateGenerated(key, _)
            | Self::Disconnected(key) => *key,
        }
    }
}
