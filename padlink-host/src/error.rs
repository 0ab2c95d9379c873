use padlink_core::EndpointId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),

    #[error("screen capture revoked: {0}")]
    Revoked(String),
}

#[derive(Debug, Error, Clone)]
pub enum HostError {
    #[error("negotiation with {member} failed: {reason}")]
    Negotiation { member: EndpointId, reason: String },

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl HostError {
    pub fn negotiation(member: EndpointId, err: impl std::fmt::Display) -> Self {
        Self::Negotiation {
            member,
            reason: err.to_string(),
        }
    }
}
