use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A chat line fanned out to a room. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender_name: String,
    pub text: String,
    /// Milliseconds since the Unix epoch, stamped by the relay.
    pub timestamp: i64,
    pub is_host: bool,
}

impl ChatMessage {
    pub fn now(sender_name: impl Into<String>, text: impl Into<String>, is_host: bool) -> Self {
        Self {
            sender_name: sender_name.into(),
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
            is_host,
        }
    }
}
