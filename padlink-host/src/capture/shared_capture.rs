use crate::capture::{CaptureSource, CaptureStream};
use crate::error::CaptureError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Default)]
struct CaptureSlot {
    stream: Option<Arc<CaptureStream>>,
    leases: usize,
}

struct SharedCaptureInner {
    source: Arc<dyn CaptureSource>,
    slot: Mutex<CaptureSlot>,
}

/// The one capture stream shared by every peer link of a host.
///
/// Capture starts on the first [`acquire`](SharedCapture::acquire) and stops
/// when the last [`CaptureLease`] is released. The slot lock is held while
/// starting, so callers racing the first acquisition wait for it and reuse
/// its result instead of starting a second capture.
///
/// A revoked stream keeps serving the leases already taken on it, but no new
/// ones are handed out until it has been released and started afresh.
#[derive(Clone)]
pub struct SharedCapture {
    inner: Arc<SharedCaptureInner>,
}

impl SharedCapture {
    pub fn new(source: Arc<dyn CaptureSource>) -> Self {
        Self {
            inner: Arc::new(SharedCaptureInner {
                source,
                slot: Mutex::new(CaptureSlot::default()),
            }),
        }
    }

    pub async fn acquire(&self) -> Result<CaptureLease, CaptureError> {
        let mut slot = self.inner.slot.lock().await;

        let stream = match &slot.stream {
            Some(stream) => {
                if let Some(error) = stream.revocation() {
                    warn!("Refusing capture lease: {}", error);
                    return Err(error);
                }
                stream.clone()
            }
            None => {
                let stream = Arc::new(self.inner.source.start().await?);
                info!("Capture started ({} tracks)", stream.tracks().len());
                slot.stream = Some(stream.clone());
                stream
            }
        };
        slot.leases += 1;
        debug!("Capture lease taken, {} active", slot.leases);

        Ok(CaptureLease {
            stream,
            owner: Some(self.clone()),
        })
    }

    pub async fn is_active(&self) -> bool {
        self.inner.slot.lock().await.stream.is_some()
    }

    pub async fn lease_count(&self) -> usize {
        self.inner.slot.lock().await.leases
    }

    async fn release_one(&self) {
        let mut slot = self.inner.slot.lock().await;
        slot.leases = slot.leases.saturating_sub(1);
        debug!("Capture lease returned, {} active", slot.leases);

        if slot.leases > 0 {
            return;
        }
        let Some(stream) = slot.stream.take() else {
            return;
        };
        stream.stop();
        self.inner.source.stop(&stream).await;
        info!("Capture stopped");
    }
}

/// One peer link's claim on the shared stream.
///
/// Prefer [`release`](CaptureLease::release). Dropping an unreleased lease
/// returns it from a spawned task.
pub struct CaptureLease {
    stream: Arc<CaptureStream>,
    owner: Option<SharedCapture>,
}

impl CaptureLease {
    pub fn stream(&self) -> &Arc<CaptureStream> {
        &self.stream
    }

    pub async fn release(mut self) {
        if let Some(owner) = self.owner.take() {
            owner.release_one().await;
        }
    }
}

impl Drop for CaptureLease {
    fn drop(&mut self) {
        let Some(owner) = self.owner.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { owner.release_one().await });
            }
            Err(_) => warn!("Capture lease dropped outside a runtime, capture left running"),
        }
    }
}
