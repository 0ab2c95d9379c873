use crate::model::peer::EndpointId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const GENERATED_CODE_LEN: usize = 6;

/// Short code identifying a room while its session is active.
///
/// Codes are compared case-insensitively: every constructor trims and
/// upper-cases the input.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Random six character code, the format hosts hand out to players.
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self::new(&raw[..GENERATED_CODE_LEN])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for a code that was blank after trimming. No room may use it.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A client endpoint that joined a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: EndpointId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(id: EndpointId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            joined_at: Utc::now(),
        }
    }
}
