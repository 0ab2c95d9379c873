use crate::registry::{RegistryError, Session};
use crate::signaling::PeerDirectory;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use padlink_core::{EndpointId, Member, RoomCode, ServerMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Notice every member receives when the host of their room goes away.
pub const HOST_DISCONNECTED: &str = "Host disconnected";

#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Maximum number of members per room. `None` means unlimited.
    pub max_members: Option<usize>,
}

/// Rooms that were affected by one endpoint going away.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// Rooms the endpoint was hosting. They no longer exist.
    pub closed: Vec<RoomCode>,
    /// Rooms the endpoint was a member of.
    pub left: Vec<RoomCode>,
}

/// All active sessions, keyed by room code.
///
/// Every mutation of a room happens while its map entry is locked, and the
/// notices it produces are enqueued before the lock is released. Two
/// operations on the same room are therefore never interleaved, and a client
/// always has its notice queued before it disappears from the room.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomCode, Session>>,
    directory: PeerDirectory,
    config: RegistryConfig,
}

impl RoomRegistry {
    pub fn new(directory: PeerDirectory, config: RegistryConfig) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            directory,
            config,
        }
    }

    pub fn create(&self, code: RoomCode, host: EndpointId) -> Result<(), RegistryError> {
        if code.is_empty() {
            return Err(RegistryError::EmptyRoomCode);
        }
        match self.rooms.entry(code.clone()) {
            Entry::Occupied(_) => Err(RegistryError::RoomCodeTaken(code)),
            Entry::Vacant(slot) => {
                slot.insert(Session::new(code.clone(), host));
                info!("Room {} created by {}", code, host);
                self.directory
                    .deliver(&host, ServerMessage::RoomCreated { room_id: code });
                Ok(())
            }
        }
    }

    /// Adds `member` to the room and tells both sides.
    ///
    /// Joining a room one is already in keeps the original membership but
    /// tells the host again, so it can rebuild a link that has died.
    pub fn join(
        &self,
        code: &RoomCode,
        member: EndpointId,
        name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let mut session = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RegistryError::RoomNotFound(code.clone()))?;

        if session.host() == member {
            return Err(RegistryError::HostCannotJoin(code.clone()));
        }

        let existing = session.member(&member).map(|m| m.name.clone());
        let name = match existing {
            Some(name) => {
                debug!("{} joined room {} again", member, code);
                name
            }
            None => {
                if let Some(max) = self.config.max_members {
                    if session.len() >= max {
                        return Err(RegistryError::RoomFull(code.clone()));
                    }
                }

                let joined = Member::new(member, name);
                info!("{} ({}) joined room {}", joined.name, joined.id, code);
                let name = joined.name.clone();
                session.insert(joined);
                name
            }
        };

        self.directory.deliver(
            &session.host(),
            ServerMessage::ClientJoined {
                member_id: member,
                name,
            },
        );
        self.directory.deliver(
            &member,
            ServerMessage::RoomJoined {
                room_id: code.clone(),
            },
        );
        Ok(())
    }

    /// Removes a member. Returns whether it was present.
    pub fn remove_member(&self, code: &RoomCode, member: &EndpointId) -> bool {
        let Some(mut session) = self.rooms.get_mut(code) else {
            return false;
        };
        if session.remove(member).is_none() {
            return false;
        }

        info!("{} left room {}", member, code);
        self.directory.deliver(
            &session.host(),
            ServerMessage::ClientLeft { member_id: *member },
        );
        true
    }

    /// Host-initiated removal. The target gets its `kicked` notice before it
    /// leaves the member set. Requests from anyone but the host are ignored.
    pub fn kick(&self, code: &RoomCode, requester: &EndpointId, member: &EndpointId) -> bool {
        let Some(mut session) = self.rooms.get_mut(code) else {
            debug!("Kick for unknown room {}", code);
            return false;
        };
        if session.host() != *requester {
            warn!("{} tried to kick {} from {} without hosting it", requester, member, code);
            return false;
        }
        if !session.contains(member) {
            return false;
        }

        self.directory.deliver(
            member,
            ServerMessage::Kicked {
                room_id: code.clone(),
            },
        );
        session.remove(member);
        info!("Host {} kicked {} from room {}", requester, member, code);
        self.directory.deliver(
            &session.host(),
            ServerMessage::ClientLeft { member_id: *member },
        );
        true
    }

    /// Applies the departure of `endpoint` to every room it was part of.
    ///
    /// Rooms it hosted are torn down: each remaining member receives exactly
    /// one termination notice and the session is removed in the same pass.
    /// Rooms it had joined lose it as a member and their host is told.
    pub fn disconnect(&self, endpoint: &EndpointId) -> DisconnectOutcome {
        let mut outcome = DisconnectOutcome::default();

        self.rooms.retain(|code, session| {
            if session.host() == *endpoint {
                for member in session.member_ids() {
                    self.directory
                        .deliver(&member, ServerMessage::error(HOST_DISCONNECTED));
                }
                info!("Room {} closed, host {} disconnected", code, endpoint);
                outcome.closed.push(code.clone());
                return false;
            }

            if session.remove(endpoint).is_some() {
                self.directory.deliver(
                    &session.host(),
                    ServerMessage::ClientLeft {
                        member_id: *endpoint,
                    },
                );
                outcome.left.push(code.clone());
            }
            true
        });

        outcome
    }

    /// Sends the message built by `build` to every participant of the room
    /// except `except`. Returns `None` when the room does not exist.
    pub fn broadcast<F>(
        &self,
        code: &RoomCode,
        except: Option<&EndpointId>,
        build: F,
    ) -> Option<usize>
    where
        F: FnOnce(&Session) -> ServerMessage,
    {
        let session = self.rooms.get(code)?;
        let msg = build(&session);
        Some(self.fan_out(&session, except, msg))
    }

    /// Broadcasts to the whole room, `sender` included, but only when the
    /// sender is its host or one of its members. Returns `None` otherwise,
    /// or when the room does not exist.
    pub fn broadcast_from<F>(&self, code: &RoomCode, sender: &EndpointId, build: F) -> Option<usize>
    where
        F: FnOnce(&Session) -> ServerMessage,
    {
        let session = self.rooms.get(code)?;
        if session.host() != *sender && !session.contains(sender) {
            return None;
        }
        let msg = build(&session);
        Some(self.fan_out(&session, None, msg))
    }

    fn fan_out(&self, session: &Session, except: Option<&EndpointId>, msg: ServerMessage) -> usize {
        let mut delivered = 0;
        for participant in session.participants() {
            if Some(&participant) == except {
                continue;
            }
            if self.directory.deliver(&participant, msg.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn members(&self, code: &RoomCode) -> Option<Vec<Member>> {
        self.rooms.get(code).map(|s| s.members())
    }

    pub fn host_of(&self, code: &RoomCode) -> Option<EndpointId> {
        self.rooms.get(code).map(|s| s.host())
    }

    /// True when `id` is the host or a member of the room.
    pub fn is_participant(&self, code: &RoomCode, id: &EndpointId) -> bool {
        self.rooms
            .get(code)
            .is_some_and(|s| s.host() == *id || s.contains(id))
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
