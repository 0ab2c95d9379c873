use crate::capture::SharedCapture;
use crate::config::HostConfig;
use crate::orchestrator::{HostBehavior, HostCommand, HostContext, Orchestrator};
use crate::signaling::{RelayClient, RelaySignaling, fetch_ice_servers};
use crate::transport::TransportConfig;
use anyhow::{Context, Result};
use padlink_core::{ClientMessage, EndpointId, RoomCode, ServerMessage};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A host that owns a room on the relay and runs the orchestrator for it.
///
/// Relay traffic for the room is translated into [`HostCommand`]s; outgoing
/// offers, candidates and kicks go back through [`RelaySignaling`].
pub struct HostSession {
    room: RoomCode,
    name: String,
    relay: RelayClient,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    commands: mpsc::Sender<HostCommand>,
    context: HostContext,
    orchestrator: JoinHandle<()>,
}

impl HostSession {
    /// Connects to the relay, claims the room and starts the orchestrator.
    pub async fn start(
        config: HostConfig,
        behavior: Box<dyn HostBehavior>,
        capture: SharedCapture,
    ) -> Result<Self> {
        let ice_servers = match config.ice_servers.clone() {
            Some(servers) => servers,
            None => fetch_ice_servers(&config.ice_url()).await,
        };

        let (relay, mut inbound) = RelayClient::connect(&config.ws_url()).await?;
        info!("Connected to relay as {}", relay.endpoint_id());

        let room = config.room.clone().unwrap_or_else(RoomCode::generate);
        relay.send(ClientMessage::CreateRoom {
            room_id: room.clone(),
        })?;
        match inbound.recv().await {
            Some(ServerMessage::RoomCreated { room_id }) if room_id == room => {}
            Some(ServerMessage::Error { message }) => {
                anyhow::bail!("Relay refused room {}: {}", room, message)
            }
            Some(other) => anyhow::bail!("Expected room-created, got {:?}", other),
            None => anyhow::bail!("Relay closed the connection"),
        }
        info!("Hosting room {}", room);

        let (commands, command_rx) = mpsc::channel(256);
        let orchestrator = Orchestrator::new(
            behavior,
            command_rx,
            Box::new(RelaySignaling::new(relay.clone(), room.clone())),
            TransportConfig::new(ice_servers),
            capture,
        );
        let context = orchestrator.context();
        let orchestrator = tokio::spawn(orchestrator.run());

        Ok(Self {
            room,
            name: config.name,
            relay,
            inbound,
            commands,
            context,
            orchestrator,
        })
    }

    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    pub fn endpoint_id(&self) -> EndpointId {
        self.relay.endpoint_id()
    }

    pub fn context(&self) -> HostContext {
        self.context.clone()
    }

    /// Sender for driving the orchestrator directly, e.g. to kick a member.
    pub fn commands(&self) -> mpsc::Sender<HostCommand> {
        self.commands.clone()
    }

    /// Sends a chat line to the room as the host.
    pub fn chat(&self, text: impl Into<String>) -> Result<()> {
        self.relay.send(ClientMessage::ChatMessage {
            room_id: self.room.clone(),
            text: text.into(),
            sender_name: self.name.clone(),
        })
    }

    /// Pumps relay traffic into the orchestrator until the relay goes away or
    /// `shutdown` resolves, then closes every link.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down host for room {}", self.room);
                    break;
                }
                msg = self.inbound.recv() => {
                    let Some(msg) = msg else {
                        warn!("Relay connection lost");
                        break;
                    };
                    if let Some(cmd) = translate(msg) {
                        self.commands
                            .send(cmd)
                            .await
                            .context("Orchestrator stopped")?;
                    }
                }
            }
        }

        let _ = self.commands.send(HostCommand::Shutdown).await;
        self.orchestrator
            .await
            .context("Orchestrator task failed")?;
        Ok(())
    }
}

fn translate(msg: ServerMessage) -> Option<HostCommand> {
    match msg {
        ServerMessage::ClientJoined { member_id, name } => {
            Some(HostCommand::ClientJoined { member_id, name })
        }
        ServerMessage::ClientLeft { member_id } => Some(HostCommand::ClientLeft { member_id }),
        ServerMessage::Answer(relayed) => Some(HostCommand::Answer {
            member_id: relayed.sender,
            payload: relayed.payload,
        }),
        ServerMessage::IceCandidate(relayed) => Some(HostCommand::IceCandidate {
            member_id: relayed.sender,
            payload: relayed.payload,
        }),
        ServerMessage::ChatMessage(message) => Some(HostCommand::Chat(message)),
        ServerMessage::Error { message } => {
            warn!("Relay error: {}", message);
            None
        }
        other => {
            debug!("Ignoring relay message {:?}", other);
            None
        }
    }
}
