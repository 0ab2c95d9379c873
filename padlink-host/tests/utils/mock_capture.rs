use async_trait::async_trait;
use padlink_host::{
    CaptureError, CaptureRevoker, CaptureSource, CaptureStream, SampleTrackSource,
};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Capture source that counts starts and stops and can be switched off.
#[derive(Clone, Default)]
pub struct CountingCaptureSource {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    running: Arc<Mutex<Option<CaptureRevoker>>>,
}

impl CountingCaptureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        let source = Self::default();
        source.set_unavailable(true);
        source
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Revokes the most recently started stream, like a user withdrawing
    /// screen-share permission mid-session.
    pub fn revoke(&self, reason: &str) {
        if let Some(revoker) = self.running.lock().unwrap().as_ref() {
            revoker.revoke(reason);
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureSource for CountingCaptureSource {
    async fn start(&self) -> Result<CaptureStream, CaptureError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CaptureError::Unavailable("user denied screen share".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        let stream = SampleTrackSource::new().start().await?;
        *self.running.lock().unwrap() = Some(stream.revoker());
        Ok(stream)
    }

    async fn stop(&self, _stream: &CaptureStream) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
