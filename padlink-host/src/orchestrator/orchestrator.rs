use dashmap::DashMap;
use padlink_core::{ControlMessage, EndpointId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use webrtc::data_channel::RTCDataChannel;

use crate::capture::SharedCapture;
use crate::error::HostError;
use crate::orchestrator::context::HostContext;
use crate::orchestrator::host_behavior::HostBehavior;
use crate::orchestrator::host_command::HostCommand;
use crate::orchestrator::negotiation::spawn_negotiation;
use crate::orchestrator::peer_link::{PeerLink, PeerLinkState};
use crate::signaling::SignalingOutput;
use crate::transport::{LinkKey, TransportConfig, TransportEvent};

/// The host's peer orchestrator.
///
/// Owns one [`PeerLink`] per member and drives every link's state machine
/// from a single loop. Network work (negotiation, applying answers and
/// candidates, teardown) runs in spawned tasks, so a slow link never holds up
/// the others.
pub struct Orchestrator {
    behavior: Box<dyn HostBehavior>,

    links: HashMap<EndpointId, PeerLink>,

    /// Link states published to [`HostContext`].
    states: Arc<DashMap<EndpointId, PeerLinkState>>,

    /// Open control channels, kept so they live as long as their link.
    channels: HashMap<EndpointId, Arc<RTCDataChannel>>,

    command_rx: mpsc::Receiver<HostCommand>,

    transport_rx: mpsc::Receiver<TransportEvent>,

    transport_tx: mpsc::Sender<TransportEvent>,

    signaling: Box<dyn SignalingOutput>,

    transport_config: TransportConfig,

    capture: SharedCapture,

    next_epoch: u64,
}

impl Orchestrator {
    pub fn new(
        behavior: Box<dyn HostBehavior>,
        command_rx: mpsc::Receiver<HostCommand>,
        signaling: Box<dyn SignalingOutput>,
        transport_config: TransportConfig,
        capture: SharedCapture,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(256);

        Self {
            behavior,
            links: HashMap::new(),
            states: Arc::new(DashMap::new()),
            channels: HashMap::new(),
            command_rx,
            transport_rx,
            transport_tx,
            signaling,
            transport_config,
            capture,
            next_epoch: 0,
        }
    }

    pub fn context(&self) -> HostContext {
        HostContext::new(self.states.clone())
    }

    /// Runs the event loop until the command channel closes or
    /// [`HostCommand::Shutdown`] arrives. Every link is closed on the way out.
    pub async fn run(mut self) {
        info!("Orchestrator loop started");

        loop {
            let ctx = self.context();

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(HostCommand::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(c) => self.handle_command(c, &ctx).await,
                        None => {
                            info!("Command channel closed. Shutting down orchestrator.");
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_transport_event(e, &ctx).await,
                        None => {
                            warn!("Transport channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        let ctx = self.context();
        let members: Vec<_> = self.links.keys().copied().collect();
        for member in members {
            self.close_link(&member, &ctx).await;
        }
        info!("Orchestrator loop finished");
    }

    async fn handle_command(&mut self, cmd: HostCommand, ctx: &HostContext) {
        match cmd {
            HostCommand::ClientJoined { member_id, name } => {
                if self.links.contains_key(&member_id) {
                    debug!("{} joined again; keeping its existing link", member_id);
                    return;
                }
                self.open_link(member_id, name);
            }

            HostCommand::ClientLeft { member_id } => {
                self.close_link(&member_id, ctx).await;
            }

            HostCommand::Kick { member_id } => {
                info!("Kicking {}", member_id);
                self.close_link(&member_id, ctx).await;
                self.signaling.kick(member_id).await;
            }

            HostCommand::Answer { member_id, payload } => {
                self.apply_answer(member_id, payload);
            }

            HostCommand::IceCandidate { member_id, payload } => {
                let Some(transport) = self.links.get(&member_id).and_then(|l| l.transport.clone())
                else {
                    debug!("Dropping ICE candidate for {} without a transport", member_id);
                    return;
                };
                tokio::spawn(async move {
                    if let Err(e) = transport.add_ice_candidate(payload).await {
                        warn!("Failed to add ICE candidate for {}: {:?}", member_id, e);
                    }
                });
            }

            HostCommand::Chat(message) => {
                self.behavior.on_chat(ctx, message).await;
            }

            HostCommand::Shutdown => {}
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent, ctx: &HostContext) {
        let key = event.key();
        let current = self.links.get(&key.member).map(|l| l.key) == Some(key);

        if !current {
            debug!("Dropping event for stale link {}", key);
            // An offer that lost the race against its link's closure still
            // owns resources.
            if let TransportEvent::OfferReady {
                transport, lease, ..
            } = event
            {
                tokio::spawn(async move {
                    let _ = transport.close().await;
                    lease.release().await;
                });
            }
            return;
        }

        match event {
            TransportEvent::OfferReady {
                transport,
                lease,
                offer,
                ..
            } => {
                let Some(link) = self.links.get_mut(&key.member) else {
                    return;
                };
                link.transport = Some(transport);
                link.lease = Some(lease);
                let pending = link.mark_offer_sent();

                info!("Sending offer to {} ({})", link.name, key.member);
                self.signaling.send_offer(key.member, offer).await;
                for candidate in pending {
                    self.signaling.send_ice(key.member, candidate).await;
                }
            }

            TransportEvent::NegotiationFailed { error, .. } => {
                match &error {
                    HostError::Capture(capture_error) => {
                        error!("No capture for {}: {}", key.member, capture_error);
                        self.behavior
                            .on_capture_unavailable(ctx, key.member, capture_error)
                            .await;
                    }
                    HostError::Negotiation { .. } => error!("{}", error),
                }
                self.close_link(&key.member, ctx).await;
            }

            TransportEvent::NegotiationNeeded(_) => {
                // The only offer is made on entry to `negotiating`; any later
                // request collapses into it.
                if let Some(link) = self.links.get(&key.member) {
                    debug!(
                        "Negotiation needed for {} while {}; already handled",
                        key,
                        link.state()
                    );
                }
            }

            TransportEvent::ChannelOpen(_, channel) => {
                if !self.set_state(&key.member, PeerLinkState::Connected) {
                    return;
                }
                info!("{} connected", key.member);
                self.channels.insert(key.member, channel);
                self.behavior.on_connected(ctx, key.member).await;
            }

            TransportEvent::Control(_, data) => match ControlMessage::decode(&data) {
                Ok(input) => self.behavior.on_control(ctx, key.member, input).await,
                Err(e) => warn!("Dropping malformed control frame from {}: {}", key.member, e),
            },

            TransportEvent::RemoteTrack(_, track) => {
                info!("{} is sending {}", key.member, track.kind());
                self.behavior.on_member_track(ctx, key.member, track).await;
            }

            TransportEvent::CandidateGenerated(_, candidate) => {
                let Some(link) = self.links.get_mut(&key.member) else {
                    return;
                };
                if let Some(candidate) = link.queue_candidate(candidate) {
                    self.signaling.send_ice(key.member, candidate).await;
                }
            }

            TransportEvent::Disconnected(_) => {
                info!("Transport disconnected for {}", key.member);
                self.close_link(&key.member, ctx).await;
            }
        }
    }

    fn open_link(&mut self, member: EndpointId, name: String) {
        self.next_epoch += 1;
        let key = LinkKey {
            member,
            epoch: self.next_epoch,
        };
        let mut link = PeerLink::new(key, name);

        if let Err(e) = link.transition(PeerLinkState::Negotiating) {
            error!("{}", e);
            return;
        }
        info!("Negotiating with {} ({})", link.name, member);

        spawn_negotiation(
            key,
            self.transport_config.clone(),
            self.capture.clone(),
            self.transport_tx.clone(),
            link.cancel.clone(),
        );
        self.states.insert(member, link.state());
        self.links.insert(member, link);
    }

    fn apply_answer(&mut self, member: EndpointId, payload: Value) {
        let Some(link) = self.links.get(&member) else {
            debug!("Dropping answer from {} without a link", member);
            return;
        };
        if link.state() != PeerLinkState::Negotiating {
            debug!("Ignoring answer from {} while {}", member, link.state());
            return;
        }
        let Some(transport) = link.transport.clone() else {
            warn!("Answer from {} arrived before its offer", member);
            return;
        };

        let key = link.key;
        let events = self.transport_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.set_remote_answer(payload).await {
                let error = HostError::negotiation(member, e);
                let _ = events
                    .send(TransportEvent::NegotiationFailed { key, error })
                    .await;
            }
        });
    }

    fn set_state(&mut self, member: &EndpointId, next: PeerLinkState) -> bool {
        let Some(link) = self.links.get_mut(member) else {
            return false;
        };
        if let Err(e) = link.transition(next) {
            warn!("{} for {}", e, member);
            return false;
        }
        self.states.insert(*member, next);
        true
    }

    /// Moves a link to `closed` and drops it. Its connection and capture
    /// lease are released in the background; the capture stops once the last
    /// lease is back.
    async fn close_link(&mut self, member: &EndpointId, ctx: &HostContext) {
        let Some(mut link) = self.links.remove(member) else {
            return;
        };
        let was_connected = link.state() == PeerLinkState::Connected;

        if let Err(e) = link.transition(PeerLinkState::Closed) {
            warn!("{} for {}", e, member);
        }
        link.cancel.cancel();
        self.states.remove(member);
        self.channels.remove(member);

        let transport = link.transport.take();
        let lease = link.lease.take();
        tokio::spawn(async move {
            if let Some(transport) = transport {
                if let Err(e) = transport.close().await {
                    warn!("Failed to close transport: {:?}", e);
                }
            }
            if let Some(lease) = lease {
                lease.release().await;
            }
        });

        info!("Link to {} ({}) closed", link.name, member);
        if was_connected {
            self.behavior.on_closed(ctx, *member).await;
        }
    }
}
