use chrono::{DateTime, Utc};
use padlink_core::{EndpointId, Member, RoomCode};
use std::collections::HashMap;

/// One active room: its host and the members that joined it.
///
/// The host id is never present in `members`.
#[derive(Debug, Clone)]
pub struct Session {
    code: RoomCode,
    host: EndpointId,
    members: HashMap<EndpointId, Member>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(code: RoomCode, host: EndpointId) -> Self {
        Self {
            code,
            host,
            members: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> EndpointId {
        self.host
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.members.contains_key(id)
    }

    pub fn member(&self, id: &EndpointId) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in join order.
    pub fn members(&self) -> Vec<Member> {
        let mut members: Vec<Member> = self.members.values().cloned().collect();
        members.sort_by_key(|m| m.joined_at);
        members
    }

    pub fn member_ids(&self) -> impl Iterator<Item = EndpointId> + '_ {
        self.members.keys().copied()
    }

    /// Host first, then every member.
    pub fn participants(&self) -> impl Iterator<Item = EndpointId> + '_ {
        std::iter::once(self.host).chain(self.member_ids())
    }

    pub(crate) fn insert(&mut self, member: Member) {
        self.members.insert(member.id, member);
    }

    pub(crate) fn remove(&mut self, id: &EndpointId) -> Option<Member> {
        self.members.remove(id)
    }
}
