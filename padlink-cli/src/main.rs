use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use padlink::host::{
    HostBehavior, HostConfig, HostContext, HostSession, SampleTrackSource, SharedCapture,
    TrackRemote,
};
use padlink::model::{ChatMessage, ControlMessage, EndpointId, IceServerConfig, InputState};
use padlink::server::{DEFAULT_PORT, RegistryConfig, ServerConfig};
use padlink::RoomCode;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "padlink")]
#[command(about = "Screen sharing with virtual controllers over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(short, long, env = "PADLINK_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(long, env = "TURN_URL")]
        turn_url: Option<String>,

        #[arg(long, env = "TURN_USERNAME")]
        turn_username: Option<String>,

        #[arg(long, env = "TURN_CREDENTIAL")]
        turn_credential: Option<String>,

        /// Members allowed per room; unlimited when absent.
        #[arg(long, env = "PADLINK_MAX_MEMBERS")]
        max_members: Option<usize>,
    },
    /// Host a room and stream to everyone who joins.
    Host {
        #[arg(short, long, env = "PADLINK_SERVER", default_value = "http://127.0.0.1:3001")]
        server: String,

        /// Room code to claim; a random one is generated otherwise.
        #[arg(short, long)]
        room: Option<String>,

        #[arg(short, long, default_value = "Host")]
        name: String,

        /// VP8 IVF file to loop as the shared screen.
        #[arg(long)]
        ivf: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            port,
            turn_url,
            turn_username,
            turn_credential,
            max_members,
        } => {
            let mut config = ServerConfig {
                bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
                registry: RegistryConfig { max_members },
                ..ServerConfig::default()
            };
            if let Some(url) = turn_url {
                config.ice_servers.push(IceServerConfig {
                    urls: vec![url],
                    username: turn_username,
                    credential: turn_credential,
                });
            }

            println!(
                "{} {}",
                "📡 Relay listening on".green().bold(),
                config.bind.to_string().cyan()
            );
            padlink::server::serve(config).await?;
            println!("{}", "Relay stopped".yellow());
        }

        Commands::Host {
            server,
            room,
            name,
            ivf,
        } => {
            let source = match ivf {
                Some(path) => SampleTrackSource::with_ivf(path),
                None => SampleTrackSource::new(),
            };
            let config = HostConfig {
                server_url: server,
                room: room.map(RoomCode::new),
                name,
                ..HostConfig::default()
            };

            let session = HostSession::start(
                config,
                Box::new(LoggingBehavior::default()),
                SharedCapture::new(Arc::new(source)),
            )
            .await
            .context("Could not start hosting")?;

            println!(
                "{} {}",
                "🎮 Hosting room".green().bold(),
                session.room().as_str().bold()
            );
            session
                .run(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
            println!("{}", "Room closed".yellow());
        }
    }

    Ok(())
}

/// Logs every player event and keeps the latest input per player.
#[derive(Default)]
struct LoggingBehavior {
    inputs: Mutex<HashMap<EndpointId, InputState>>,
}

#[async_trait]
impl HostBehavior for LoggingBehavior {
    async fn on_connected(&self, ctx: &HostContext, member: EndpointId) {
        println!(
            "{} {} ({} connected)",
            "➕ Player connected:".green(),
            member,
            ctx.connected_members().len()
        );
        self.inputs.lock().await.insert(member, InputState::new());
    }

    async fn on_control(&self, _ctx: &HostContext, member: EndpointId, input: ControlMessage) {
        let mut inputs = self.inputs.lock().await;
        let state = inputs.entry(member).or_default();
        if state.apply(&input) != Some(input.value()) {
            info!("{} {:?} = {:?}", member, input.key(), input.value());
        }
    }

    async fn on_closed(&self, _ctx: &HostContext, member: EndpointId) {
        self.inputs.lock().await.remove(&member);
        println!("{} {}", "➖ Player left:".yellow(), member);
    }

    async fn on_member_track(
        &self,
        _ctx: &HostContext,
        member: EndpointId,
        track: Arc<TrackRemote>,
    ) {
        println!("{} {} ({})", "🎤 Voice from".cyan(), member, track.kind());
        // Headless: keep the receiver drained so the interceptors keep running.
        tokio::spawn(async move {
            let mut packets = 0u64;
            while track.read_rtp().await.is_ok() {
                packets += 1;
            }
            debug!("Voice from {} ended after {} packets", member, packets);
        });
    }

    async fn on_chat(&self, _ctx: &HostContext, message: ChatMessage) {
        println!("{} {}", format!("[{}]", message.sender_name).cyan(), message.text);
    }
}
