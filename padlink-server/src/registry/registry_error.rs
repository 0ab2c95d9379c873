use padlink_core::RoomCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room code must not be empty")]
    EmptyRoomCode,

    #[error("room code {0} is already in use")]
    RoomCodeTaken(RoomCode),

    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("the host of room {0} cannot join it as a member")]
    HostCannotJoin(RoomCode),
}
