use crate::error::CaptureError;
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use webrtc::track::track_local::TrackLocal;

/// A running screen capture: the media tracks every peer link sends.
pub struct CaptureStream {
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
    stop: CancellationToken,
    revoker: CaptureRevoker,
}

impl CaptureStream {
    pub fn new(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self {
            tracks,
            stop: CancellationToken::new(),
            revoker: CaptureRevoker::default(),
        }
    }

    /// Handle the source keeps to report that the running capture was taken
    /// away, e.g. screen-share permission withdrawn.
    pub fn revoker(&self) -> CaptureRevoker {
        self.revoker.clone()
    }

    /// Why the capture was revoked, if it was.
    pub fn revocation(&self) -> Option<CaptureError> {
        self.revoker
            .reason
            .get()
            .map(|reason| CaptureError::Revoked(reason.clone()))
    }

    pub fn is_revoked(&self) -> bool {
        self.revoker.reason.get().is_some()
    }

    pub fn tracks(&self) -> &[Arc<dyn TrackLocal + Send + Sync>] {
        &self.tracks
    }

    /// Cancelled once the last user of the stream is gone. Frame producers
    /// should watch it and exit.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub(crate) fn stop(&self) {
        self.stop.cancel();
    }
}

/// Marks a running [`CaptureStream`] as revoked. The first reason wins.
#[derive(Debug, Clone, Default)]
pub struct CaptureRevoker {
    reason: Arc<OnceLock<String>>,
}

impl CaptureRevoker {
    pub fn revoke(&self, reason: impl Into<String>) {
        let _ = self.reason.set(reason.into());
    }
}

/// Where the shared stream comes from.
#[async_trait]
pub trait CaptureSource: Send + Sync + 'static {
    async fn start(&self) -> Result<CaptureStream, CaptureError>;

    /// Called after the stream's stop token has been cancelled.
    async fn stop(&self, _stream: &CaptureStream) {}
}
