use crate::config::ServerConfig;
use crate::http::{client_log_handler, ice_handler};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub struct AppState {
    pub signaling: SignalingService,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            signaling: SignalingService::new(config.ice_servers.clone(), config.registry.clone()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/ice", get(ice_handler))
        .route("/api/client-log", post(client_log_handler))
        .layer(cors)
        .with_state(state)
}

/// Binds the listener and returns the bound address together with a future
/// that serves until `shutdown` resolves.
pub async fn bind(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = Result<()>> + Send)> {
    let state = Arc::new(AppState::new(&config));
    let app = router(state);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    let addr = listener.local_addr()?;
    info!("Signaling server listening on http://{}", addr);

    let serve = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Signaling server failed")
    };
    Ok((addr, serve))
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let (_, server) = bind(config, shutdown_signal()).await?;
    server.await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
