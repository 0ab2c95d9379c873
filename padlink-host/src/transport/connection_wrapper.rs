use crate::capture::CaptureStream;
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::{LinkKey, TransportEvent};
use anyhow::{Context, Result};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_remote::TrackRemote;

/// Label of the client-to-host input channel.
pub const CONTROL_CHANNEL_LABEL: &str = "controls";

/// The host's side of one WebRTC connection. The host always offers.
#[derive(Clone)]
pub struct ConnectionWrapper {
    pub key: LinkKey,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl ConnectionWrapper {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        key: LinkKey,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.rtc_ice_servers(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection {} is {:?}", key, s);
                    // `Disconnected` may still recover; ICE reports `Failed`
                    // if it does not.
                    match s {
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(TransportEvent::Disconnected(key)).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(&init) else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(key, value))
                    .await;
            })
        }));

        let track_tx = event_tx.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _receiver, _transceiver| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    debug!("Remote {} track from {}", track.kind(), key);
                    let _ = tx.send(TransportEvent::RemoteTrack(key, track)).await;
                })
            },
        ));

        let nn_tx = event_tx;
        peer_connection.on_negotiation_needed(Box::new(move || {
            let tx = nn_tx.clone();
            Box::pin(async move {
                let _ = tx.send(TransportEvent::NegotiationNeeded(key)).await;
            })
        }));

        Ok(Self {
            key,
            peer_connection,
        })
    }

    /// Opens the unordered, unreliable control channel. Input is only ever
    /// meaningful at its latest value, so nothing is retransmitted.
    pub async fn create_control_channel(
        &self,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<RTCDataChannel>> {
        let init = RTCDataChannelInit {
            ordered: Some(false),
            max_retransmits: Some(0),
            ..Default::default()
        };
        let dc = self
            .peer_connection
            .create_data_channel(CONTROL_CHANNEL_LABEL, Some(init))
            .await
            .context("Failed to create control channel")?;

        let key = self.key;
        let dc_on_open = dc.clone();
        let tx_open = event_tx.clone();
        dc.on_open(Box::new(move || {
            let tx = tx_open.clone();
            let channel = dc_on_open.clone();

            Box::pin(async move {
                debug!("Control channel open for {}", key);
                let _ = tx.send(TransportEvent::ChannelOpen(key, channel)).await;
            })
        }));

        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let tx = event_tx.clone();
            Box::pin(async move {
                let bytes = Bytes::from(msg.data.to_vec());
                let _ = tx.send(TransportEvent::Control(key, bytes)).await;
            })
        }));

        Ok(dc)
    }

    /// Attaches the capture tracks. RTCP from the client is drained so the
    /// interceptors keep running.
    pub async fn add_tracks(&self, stream: &CaptureStream) -> Result<()> {
        for track in stream.tracks() {
            let sender = self
                .peer_connection
                .add_track(track.clone())
                .await
                .context("Failed to add capture track")?;

            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }
        Ok(())
    }

    /// Leaves room in the offer for the client's microphone. The host never
    /// sends audio of its own.
    pub async fn add_audio_receiver(&self) -> Result<()> {
        self.peer_connection
            .add_transceiver_from_kind(
                RTPCodecType::Audio,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .context("Failed to add audio transceiver")?;
        Ok(())
    }

    /// Creates the offer and sets it as the local description. Returns it in
    /// the browser's `{type, sdp}` shape.
    pub async fn create_offer(&self) -> Result<Value> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(serde_json::to_value(&offer)?)
    }

    /// Applies the client's `{type, sdp}` answer.
    pub async fn set_remote_answer(&self, payload: Value) -> Result<()> {
        let desc: RTCSessionDescription =
            serde_json::from_value(payload).context("Failed to parse SDP answer")?;
        let answer = RTCSessionDescription::answer(desc.sdp)?;
        self.peer_connection.set_remote_description(answer).await?;
        Ok(())
    }

    /// Adds a remote ICE candidate (trickle ICE).
    pub async fn add_ice_candidate(&self, payload: Value) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_value(payload).context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
