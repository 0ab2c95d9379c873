use crate::AppState;
use axum::Json;
use axum::extract::State;
use padlink_core::IceServersResponse;
use std::sync::Arc;

/// `GET /api/ice`: the ICE servers both sides use to build their peer
/// connections.
pub async fn ice_handler(State(state): State<Arc<AppState>>) -> Json<IceServersResponse> {
    Json(IceServersResponse {
        ice_servers: state.signaling.get_ice_servers(),
    })
}
