use crate::registry::RegistryConfig;
use padlink_core::{IceServerConfig, default_ice_servers};
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub ice_servers: Vec<IceServerConfig>,
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            ice_servers: default_ice_servers(),
            registry: RegistryConfig::default(),
        }
    }
}
