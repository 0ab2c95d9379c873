use crate::orchestrator::PeerLinkState;
use dashmap::DashMap;
use padlink_core::EndpointId;
use std::sync::Arc;
use std::time::Duration;

/// Read-only view of the orchestrator's peer links.
///
/// Cheap to clone and safe to share across tasks. Closed links are removed,
/// so a member without an entry has no link.
#[derive(Clone)]
pub struct HostContext {
    links: Arc<DashMap<EndpointId, PeerLinkState>>,
}

impl HostContext {
    pub(crate) fn new(links: Arc<DashMap<EndpointId, PeerLinkState>>) -> Self {
        Self { links }
    }

    pub fn state_of(&self, member: &EndpointId) -> Option<PeerLinkState> {
        self.links.get(member).map(|entry| *entry.value())
    }

    pub fn list_members(&self) -> Vec<EndpointId> {
        self.links.iter().map(|entry| *entry.key()).collect()
    }

    pub fn connected_members(&self) -> Vec<EndpointId> {
        self.links
            .iter()
            .filter(|entry| *entry.value() == PeerLinkState::Connected)
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn contains_member(&self, member: &EndpointId) -> bool {
        self.links.contains_key(member)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Polls until `member` reaches `state` (or, for `None`, has no link).
    pub async fn wait_for_state(
        &self,
        member: &EndpointId,
        state: Option<PeerLinkState>,
        timeout: Duration,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.state_of(member) == state {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
