use padlink_core::{IceServerConfig, default_ice_servers};
use webrtc::ice_transport::ice_server::RTCIceServer;

/// WebRTC settings shared by every peer link.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
        }
    }
}

impl TransportConfig {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    pub(crate) fn rtc_ice_servers(&self) -> Vec<RTCIceServer> {
        self.ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect()
    }
}
