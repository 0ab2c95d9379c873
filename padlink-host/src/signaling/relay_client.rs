use crate::signaling::SignalingOutput;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use padlink_core::{ClientMessage, EndpointId, RoomCode, ServerMessage, Signal, SignalKind};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

/// A WebSocket connection to the relay.
///
/// Outgoing messages are queued and written by a background task; incoming
/// messages are parsed and handed out through the receiver returned by
/// [`connect`](RelayClient::connect). The receiver closes when the socket does.
#[derive(Clone)]
pub struct RelayClient {
    endpoint_id: EndpointId,
    outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl RelayClient {
    pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<ServerMessage>)> {
        let (socket, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to relay at {}", url))?;
        let (mut sender, mut receiver) = socket.split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (inbound_tx, mut inbound) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize relay message: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            let _ = sender.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let Message::Text(text) = msg else {
                    continue;
                };
                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => {
                        if inbound_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Unparseable relay message: {}", e),
                }
            }
            debug!("Relay socket closed");
        });

        let endpoint_id = match inbound.recv().await {
            Some(ServerMessage::Welcome { endpoint_id }) => endpoint_id,
            Some(other) => anyhow::bail!("Expected welcome from relay, got {:?}", other),
            None => anyhow::bail!("Relay closed the connection before greeting"),
        };

        Ok((
            Self {
                endpoint_id,
                outbound,
            },
            inbound,
        ))
    }

    /// The id the relay assigned to this connection.
    pub fn endpoint_id(&self) -> EndpointId {
        self.endpoint_id
    }

    pub fn send(&self, msg: ClientMessage) -> Result<()> {
        self.outbound
            .send(msg)
            .map_err(|_| anyhow::anyhow!("Relay connection is closed"))
    }
}

/// [`SignalingOutput`] addressing the members of one room through the relay.
#[derive(Clone)]
pub struct RelaySignaling {
    relay: RelayClient,
    room: RoomCode,
}

impl RelaySignaling {
    pub fn new(relay: RelayClient, room: RoomCode) -> Self {
        Self { relay, room }
    }

    fn signal(&self, kind: SignalKind, member: EndpointId, payload: Value) {
        let signal = Signal::to_target(member, Some(self.room.clone()), payload);
        if let Err(e) = self.relay.send(ClientMessage::signal(kind, signal)) {
            warn!("Dropping {:?} for {}: {}", kind, member, e);
        }
    }
}

#[async_trait]
impl SignalingOutput for RelaySignaling {
    async fn send_offer(&self, member: EndpointId, offer: Value) {
        self.signal(SignalKind::Offer, member, offer);
    }

    async fn send_ice(&self, member: EndpointId, candidate: Value) {
        self.signal(SignalKind::IceCandidate, member, candidate);
    }

    async fn kick(&self, member: EndpointId) {
        let msg = ClientMessage::KickClient {
            member_id: member,
            room_id: self.room.clone(),
        };
        if let Err(e) = self.relay.send(msg) {
            warn!("Could not kick {}: {}", member, e);
        }
    }
}
