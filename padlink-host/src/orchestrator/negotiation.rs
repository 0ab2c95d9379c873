use crate::capture::{CaptureStream, SharedCapture};
use crate::error::HostError;
use crate::transport::{ConnectionWrapper, LinkKey, TransportConfig, TransportEvent};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs one link's `negotiating` phase in its own task: takes a capture
/// lease, builds the peer connection with the capture tracks, a receive-only
/// audio slot for the client's voice and the control channel, and creates the
/// offer. The result goes back to the orchestrator
/// as an event.
///
/// If `cancel` fires first, whatever was built is closed and the lease
/// returned; nothing is reported.
pub(crate) fn spawn_negotiation(
    key: LinkKey,
    config: TransportConfig,
    capture: SharedCapture,
    events: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let lease = match capture.acquire().await {
            Ok(lease) => lease,
            Err(e) => {
                let _ = events
                    .send(TransportEvent::NegotiationFailed {
                        key,
                        error: e.into(),
                    })
                    .await;
                return;
            }
        };
        if cancel.is_cancelled() {
            debug!("Negotiation for {} abandoned before start", key);
            lease.release().await;
            return;
        }

        let transport = match ConnectionWrapper::new(key, &config, events.clone()).await {
            Ok(transport) => transport,
            Err(e) => {
                lease.release().await;
                let error = HostError::negotiation(key.member, e);
                let _ = events
                    .send(TransportEvent::NegotiationFailed { key, error })
                    .await;
                return;
            }
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => None,
            offer = build_offer(&transport, lease.stream(), events.clone()) => Some(offer),
        };

        match outcome {
            Some(Ok(offer)) => {
                let ready = TransportEvent::OfferReady {
                    key,
                    transport,
                    lease,
                    offer,
                };
                if let Err(mpsc::error::SendError(ready)) = events.send(ready).await {
                    // Orchestrator is gone; clean up here.
                    if let TransportEvent::OfferReady {
                        transport, lease, ..
                    } = ready
                    {
                        let _ = transport.close().await;
                        lease.release().await;
                    }
                }
            }
            Some(Err(e)) => {
                if let Err(e) = transport.close().await {
                    warn!("Failed to close {} after negotiation error: {}", key, e);
                }
                lease.release().await;
                let error = HostError::negotiation(key.member, e);
                let _ = events
                    .send(TransportEvent::NegotiationFailed { key, error })
                    .await;
            }
            None => {
                debug!("Negotiation for {} abandoned", key);
                if let Err(e) = transport.close().await {
                    warn!("Failed to close abandoned link {}: {}", key, e);
                }
                lease.release().await;
            }
        }
    });
}

async fn build_offer(
    transport: &ConnectionWrapper,
    stream: &CaptureStream,
    events: mpsc::Sender<TransportEvent>,
) -> anyhow::Result<Value> {
    transport.add_tracks(stream).await?;
    transport.add_audio_receiver().await?;
    transport.create_control_channel(events).await?;
    transport.create_offer().await
}
