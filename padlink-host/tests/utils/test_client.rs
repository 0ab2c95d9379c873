use anyhow::{Context, Result};
use bytes::Bytes;
use padlink_core::{ControlMessage, EndpointId};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One 20 ms Opus frame of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

/// A browser-like member: answers the host's offer and sends input over the
/// host-created control channel.
pub struct TestClient {
    /// The member ID for this client.
    pub member: EndpointId,
    /// The underlying RTCPeerConnection.
    peer_connection: Arc<RTCPeerConnection>,
    /// The control channel (created by the host).
    data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    /// Channel to notify when data channel is open.
    dc_open_rx: Arc<Mutex<mpsc::Receiver<()>>>,
    connection_state: Arc<Mutex<RTCPeerConnectionState>>,
    /// Generated ICE candidates (to be sent to the host).
    ice_candidates: Arc<Mutex<Vec<Value>>>,
    /// Microphone track attached when answering, if any.
    microphone: Option<Arc<TrackLocalStaticSample>>,
    /// Stops the microphone feeder.
    stop: CancellationToken,
}

impl TestClient {
    pub async fn new(member: EndpointId) -> Result<Self> {
        Self::build(member, None).await
    }

    /// A client that unmutes its microphone: the answer carries an Opus
    /// track fed with silence.
    pub async fn with_microphone(member: EndpointId) -> Result<Self> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            },
            "microphone".to_owned(),
            format!("member-{}", member),
        ));
        Self::build(member, Some(track)).await
    }

    async fn build(
        member: EndpointId,
        microphone: Option<Arc<TrackLocalStaticSample>>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        // No ICE servers: host candidates are enough on loopback.
        let peer_connection = Arc::new(api.new_peer_connection(RTCConfiguration::default()).await?);

        let (dc_open_tx, dc_open_rx) = mpsc::channel(1);
        let data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));
        let connection_state = Arc::new(Mutex::new(RTCPeerConnectionState::New));
        let ice_candidates = Arc::new(Mutex::new(Vec::new()));

        let state_clone = Arc::clone(&connection_state);
        peer_connection.on_peer_connection_state_change(Box::new(move |state| {
            let state_clone = Arc::clone(&state_clone);
            Box::pin(async move {
                tracing::debug!("[TestClient] Connection state: {:?}", state);
                *state_clone.lock().await = state;
            })
        }));

        let ice_candidates_clone = Arc::clone(&ice_candidates);
        peer_connection.on_ice_candidate(Box::new(move |candidate| {
            let ice_candidates = Arc::clone(&ice_candidates_clone);
            Box::pin(async move {
                let Some(c) = candidate else { return };
                if let Ok(json) = c.to_json() {
                    if let Ok(value) = serde_json::to_value(&json) {
                        tracing::debug!("[TestClient] ICE candidate generated");
                        ice_candidates.lock().await.push(value);
                    }
                }
            })
        }));

        let dc_clone = Arc::clone(&data_channel);
        peer_connection.on_data_channel(Box::new(move |dc| {
            let dc_clone = Arc::clone(&dc_clone);
            let dc_open_tx = dc_open_tx.clone();

            Box::pin(async move {
                tracing::debug!("[TestClient] Data channel received: {}", dc.label());

                *dc_clone.lock().await = Some(Arc::clone(&dc));

                dc.on_open(Box::new(move || {
                    let dc_open_tx = dc_open_tx.clone();
                    Box::pin(async move {
                        tracing::debug!("[TestClient] Data channel opened");
                        let _ = dc_open_tx.send(()).await;
                    })
                }));
            })
        }));

        Ok(Self {
            member,
            peer_connection,
            data_channel,
            dc_open_rx: Arc::new(Mutex::new(dc_open_rx)),
            connection_state,
            ice_candidates,
            microphone,
            stop: CancellationToken::new(),
        })
    }

    /// Apply the host's offer and return the answer in `{type, sdp}` form.
    pub async fn accept_offer(&self, offer: Value) -> Result<Value> {
        let offer: RTCSessionDescription =
            serde_json::from_value(offer).context("Offer is not a session description")?;
        let offer = RTCSessionDescription::offer(offer.sdp)?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .context("Failed to set remote description")?;

        if let Some(microphone) = &self.microphone {
            self.attach_microphone(microphone.clone()).await?;
        }

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local description")?;

        Ok(serde_json::to_value(&answer)?)
    }

    /// Adds the microphone to the host's audio slot and keeps feeding it
    /// until the client is closed.
    async fn attach_microphone(&self, track: Arc<TrackLocalStaticSample>) -> Result<()> {
        let sender = self
            .peer_connection
            .add_track(track.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add microphone track")?;

        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });

        let stop = self.stop.clone();
        tokio::spawn(async move {
            let frame = Duration::from_millis(20);
            let mut ticker = tokio::time::interval(frame);
            loop {
                tokio::select! {
                    _ = stop.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                let sample = Sample {
                    data: Bytes::from_static(&OPUS_SILENCE),
                    duration: frame,
                    ..Default::default()
                };
                let _ = track.write_sample(&sample).await;
            }
        });
        Ok(())
    }

    /// Wait for ICE gathering to complete and return all candidates.
    pub async fn gather_ice_candidates(&self, timeout_ms: u64) -> Vec<Value> {
        let mut gathering_complete = self.peer_connection.gathering_complete_promise().await;

        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            gathering_complete.recv(),
        )
        .await;

        self.ice_candidates.lock().await.clone()
    }

    /// Add a remote ICE candidate received from the host.
    pub async fn add_ice_candidate(&self, candidate: Value) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_value(candidate).context("Failed to parse ICE candidate")?;
        self.peer_connection
            .add_ice_candidate(candidate)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    /// Wait for the control channel to be open.
    pub async fn wait_for_data_channel(&self, timeout_ms: u64) -> Result<()> {
        let mut rx = self.dc_open_rx.lock().await;
        let timeout_result =
            tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), rx.recv()).await;

        match timeout_result {
            Ok(Some(())) => Ok(()),
            Ok(None) => anyhow::bail!("Data channel open channel closed"),
            Err(_) => anyhow::bail!("Timeout waiting for data channel to open"),
        }
    }

    /// Wait for the connection to be established.
    pub async fn wait_for_connection(&self, timeout_ms: u64) -> Result<()> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            let state = *self.connection_state.lock().await;
            match state {
                RTCPeerConnectionState::Connected => return Ok(()),
                RTCPeerConnectionState::Failed => anyhow::bail!("Connection failed"),
                RTCPeerConnectionState::Closed => anyhow::bail!("Connection closed"),
                _ => {}
            }

            if start.elapsed() > timeout {
                anyhow::bail!("Timeout waiting for connection (state: {:?})", state);
            }

            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }

    pub async fn control_channel_label(&self) -> Option<String> {
        self.data_channel
            .lock()
            .await
            .as_ref()
            .map(|dc| dc.label().to_owned())
    }

    /// Send one control frame as JSON text, the way the browser does.
    pub async fn send_control(&self, input: &ControlMessage) -> Result<()> {
        let text = serde_json::to_string(input)?;
        self.send_text(&text).await
    }

    pub async fn send_text(&self, text: &str) -> Result<()> {
        let dc = self
            .data_channel
            .lock()
            .await
            .clone()
            .context("Data channel not available")?;

        dc.send_text(text.to_owned())
            .await
            .context("Failed to send message")?;
        Ok(())
    }

    /// Close the peer connection.
    pub async fn close(&self) -> Result<()> {
        self.stop.cancel();
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}
