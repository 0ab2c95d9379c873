use padlink_core::{IceServerConfig, IceServersResponse, default_ice_servers};
use std::time::Duration;
use tracing::{info, warn};

const ICE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches the relay's ICE descriptor. Falls back to public STUN servers when
/// the relay cannot be reached or answers with garbage.
pub async fn fetch_ice_servers(url: &str) -> Vec<IceServerConfig> {
    match try_fetch(url).await {
        Ok(servers) => {
            info!("Using {} ICE servers from {}", servers.len(), url);
            servers
        }
        Err(e) => {
            warn!("ICE config fetch from {} failed ({}), using defaults", url, e);
            default_ice_servers()
        }
    }
}

async fn try_fetch(url: &str) -> reqwest::Result<Vec<IceServerConfig>> {
    let client = reqwest::Client::builder()
        .timeout(ICE_FETCH_TIMEOUT)
        .build()?;
    let body: IceServersResponse = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(body.ice_servers)
}
