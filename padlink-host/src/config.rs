use padlink_core::{IceServerConfig, RoomCode};

/// Settings for a headless host session.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Base URL of the relay, e.g. `http://127.0.0.1:3001`.
    pub server_url: String,
    /// Room code to claim. A random one is generated when absent.
    pub room: Option<RoomCode>,
    /// Name used when the host speaks in chat.
    pub name: String,
    /// Overrides the servers fetched from `/api/ice`.
    pub ice_servers: Option<Vec<IceServerConfig>>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3001".to_owned(),
            room: None,
            name: "Host".to_owned(),
            ice_servers: None,
        }
    }
}

impl HostConfig {
    /// WebSocket endpoint of the relay derived from `server_url`.
    pub fn ws_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_owned()
        };
        format!("{}/ws", base)
    }

    pub fn ice_url(&self) -> String {
        format!("{}/api/ice", self.server_url.trim_end_matches('/'))
    }
}
