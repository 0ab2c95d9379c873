use crate::capture::CaptureLease;
use crate::transport::{ConnectionWrapper, LinkKey};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerLinkState {
    Idle,
    Negotiating,
    Connected,
    Closed,
}

impl PeerLinkState {
    /// The transition table. `Closed` is terminal and reachable from
    /// everywhere else; the forward path can only be walked once.
    pub fn can_transition_to(self, next: PeerLinkState) -> bool {
        use PeerLinkState::*;
        matches!(
            (self, next),
            (Idle, Negotiating)
                | (Negotiating, Connected)
                | (Idle, Closed)
                | (Negotiating, Closed)
                | (Connected, Closed)
        )
    }

    pub fn is_closed(self) -> bool {
        self == PeerLinkState::Closed
    }
}

impl fmt::Display for PeerLinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PeerLinkState::Idle => "idle",
            PeerLinkState::Negotiating => "negotiating",
            PeerLinkState::Connected => "connected",
            PeerLinkState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("illegal peer link transition {from} -> {to}")]
pub struct TransitionError {
    pub from: PeerLinkState,
    pub to: PeerLinkState,
}

/// The host's connection to one member.
pub(crate) struct PeerLink {
    pub key: LinkKey,
    pub name: String,
    state: PeerLinkState,
    pub transport: Option<ConnectionWrapper>,
    pub lease: Option<CaptureLease>,
    /// Cancels the negotiation task if the link closes first.
    pub cancel: CancellationToken,
    /// Local candidates held back until the offer has gone out.
    pending_candidates: Vec<Value>,
    offer_sent: bool,
}

impl PeerLink {
    pub fn new(key: LinkKey, name: String) -> Self {
        Self {
            key,
            name,
            state: PeerLinkState::Idle,
            transport: None,
            lease: None,
            cancel: CancellationToken::new(),
            pending_candidates: Vec::new(),
            offer_sent: false,
        }
    }

    pub fn state(&self) -> PeerLinkState {
        self.state
    }

    pub fn transition(&mut self, next: PeerLinkState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Buffers `candidate` unless the offer is out, in which case it is
    /// handed back for sending.
    pub fn queue_candidate(&mut self, candidate: Value) -> Option<Value> {
        if self.offer_sent {
            Some(candidate)
        } else {
            self.pending_candidates.push(candidate);
            None
        }
    }

    /// Marks the offer as sent and returns the candidates gathered so far.
    pub fn mark_offer_sent(&mut self) -> Vec<Value> {
        self.offer_sent = true;
        std::mem::take(&mut self.pending_candidates)
    }
}
