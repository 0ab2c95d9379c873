use crate::error::CaptureError;
use crate::orchestrator::HostContext;
use async_trait::async_trait;
use padlink_core::{ChatMessage, ControlMessage, EndpointId};
use std::sync::Arc;
pub use webrtc::track::track_remote::TrackRemote;

/// What the host application does with its players.
#[async_trait]
pub trait HostBehavior: Send + Sync + 'static {
    /// The member's control channel is open.
    async fn on_connected(&self, ctx: &HostContext, member: EndpointId);

    async fn on_control(&self, ctx: &HostContext, member: EndpointId, input: ControlMessage);

    /// A previously connected member's link is gone.
    async fn on_closed(&self, ctx: &HostContext, member: EndpointId);

    /// The member started sending media, normally its microphone. Read RTP
    /// from `track` to play it; it is ignored by default.
    async fn on_member_track(
        &self,
        _ctx: &HostContext,
        _member: EndpointId,
        _track: Arc<TrackRemote>,
    ) {
    }

    async fn on_chat(&self, _ctx: &HostContext, _message: ChatMessage) {}

    /// Capture could not be started, so no link for `member` was created.
    async fn on_capture_unavailable(
        &self,
        _ctx: &HostContext,
        _member: EndpointId,
        _error: &CaptureError,
    ) {
    }
}
