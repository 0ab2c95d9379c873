use crate::registry::{RegistryConfig, RoomRegistry};
use crate::signaling::PeerDirectory;
use padlink_core::{
    ChatMessage, ClientMessage, EndpointId, IceServerConfig, RoomCode, ServerMessage, Signal,
    SignalKind,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct SignalingInner {
    directory: PeerDirectory,
    registry: RoomRegistry,
    ice_servers: Vec<IceServerConfig>,
}

/// The relay: tracks connected endpoints and routes their messages.
///
/// Signaling payloads are forwarded verbatim; only the routing keys are read.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>, registry_config: RegistryConfig) -> Self {
        let directory = PeerDirectory::new();
        let registry = RoomRegistry::new(directory.clone(), registry_config);
        Self {
            inner: Arc::new(SignalingInner {
                directory,
                registry,
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.inner.directory
    }

    /// Registers a new endpoint and greets it with its id.
    pub fn connect(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> EndpointId {
        let id = EndpointId::new();
        self.inner.directory.add_peer(id, tx);
        self.inner
            .directory
            .deliver(&id, ServerMessage::Welcome { endpoint_id: id });
        id
    }

    /// Forgets an endpoint and cascades its departure through the registry.
    ///
    /// The endpoint is removed from the directory first so nothing else can be
    /// relayed to it while its rooms are being torn down.
    pub fn disconnect(&self, id: &EndpointId) {
        self.inner.directory.remove_peer(id);
        let outcome = self.inner.registry.disconnect(id);
        if !outcome.closed.is_empty() || !outcome.left.is_empty() {
            info!(
                "{} gone: closed {:?}, left {:?}",
                id, outcome.closed, outcome.left
            );
        }
    }

    pub fn handle(&self, sender: EndpointId, msg: ClientMessage) {
        match msg {
            ClientMessage::CreateRoom { room_id } => {
                if let Err(e) = self.inner.registry.create(room_id, sender) {
                    self.reply_error(&sender, e.to_string());
                }
            }

            ClientMessage::JoinRoom { room_id, user_name } => {
                if let Err(e) = self.inner.registry.join(&room_id, sender, user_name) {
                    info!("Join from {} rejected: {}", sender, e);
                    self.reply_error(&sender, e.to_string());
                }
            }

            ClientMessage::KickClient { member_id, room_id } => {
                self.inner.registry.kick(&room_id, &sender, &member_id);
            }

            ClientMessage::Offer(signal) => self.route(sender, SignalKind::Offer, signal),
            ClientMessage::Answer(signal) => self.route(sender, SignalKind::Answer, signal),
            ClientMessage::IceCandidate(signal) => {
                self.route(sender, SignalKind::IceCandidate, signal)
            }

            ClientMessage::ChatMessage {
                room_id,
                text,
                sender_name,
            } => self.chat(sender, &room_id, sender_name, text),

            ClientMessage::ClientLog { message } => {
                info!(target: "client_log", "[client {}] {}", sender, message);
            }
        }
    }

    fn route(&self, sender: EndpointId, kind: SignalKind, signal: Signal) {
        let Signal {
            payload,
            room_id,
            target,
        } = signal;
        let msg = ServerMessage::relayed(kind, sender, payload);

        if let Some(target) = target {
            debug!("Relaying {:?} from {} to {}", kind, sender, target);
            self.inner.directory.deliver(&target, msg);
        } else if let Some(room_id) = room_id {
            if !self.inner.registry.is_participant(&room_id, &sender) {
                debug!("Dropping {:?} from {}: not in room {}", kind, sender, room_id);
                return;
            }
            debug!("Relaying {:?} from {} to room {}", kind, sender, room_id);
            if self
                .inner
                .registry
                .broadcast(&room_id, Some(&sender), |_| msg)
                .is_none()
            {
                debug!("Dropping {:?} for unknown room {}", kind, room_id);
            }
        } else {
            warn!("{:?} from {} has neither target nor room", kind, sender);
        }
    }

    fn chat(&self, sender: EndpointId, room_id: &RoomCode, sender_name: String, text: String) {
        let delivered = self
            .inner
            .registry
            .broadcast_from(room_id, &sender, |session| {
                let is_host = session.host() == sender;
                ServerMessage::ChatMessage(ChatMessage::now(sender_name, text, is_host))
            });
        match delivered {
            Some(n) => debug!("Chat from {} in {} reached {} endpoints", sender, room_id, n),
            None => debug!("Dropping chat from {}: not in room {}", sender, room_id),
        }
    }

    fn reply_error(&self, to: &EndpointId, message: String) {
        self.inner
            .directory
            .deliver(to, ServerMessage::Error { message });
    }
}
