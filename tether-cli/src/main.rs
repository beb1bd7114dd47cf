use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tether_server::{BroadcastScope, DeliveryMode, MemoryStore, RoomConfig, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Signaling rooms for peer-to-peer session setup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Push,
    Pull,
}

impl From<Mode> for DeliveryMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Push => DeliveryMode::Push,
            Mode::Pull => DeliveryMode::Pull,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Scope {
    ExcludeJoiner,
    IncludeJoiner,
}

impl From<Scope> for BroadcastScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::ExcludeJoiner => BroadcastScope::ExcludeJoiner,
            Scope::IncludeJoiner => BroadcastScope::IncludeJoiner,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the signaling HTTP API.
    Serve {
        #[arg(long, env = "TETHER_ADDR", default_value = "0.0.0.0:3000")]
        addr: SocketAddr,

        #[arg(long, env = "TETHER_MODE", value_enum, default_value = "push")]
        mode: Mode,

        #[arg(long, env = "TETHER_MAX_CLIENTS", default_value_t = 2)]
        max_clients: usize,

        #[arg(long, env = "TETHER_MIN_CLIENTS", default_value_t = 2)]
        min_clients: usize,

        #[arg(long, env = "TETHER_MAX_RETRIES", default_value_t = 5)]
        max_retries: usize,

        #[arg(long, env = "TETHER_BROADCAST_SCOPE", value_enum, default_value = "exclude-joiner")]
        broadcast_scope: Scope,

        /// Seconds an undrained pull-mode queue survives.
        #[arg(long, env = "TETHER_QUEUE_TTL", default_value_t = 300)]
        queue_ttl: u64,

        /// Seconds an issued channel token stays claimable.
        #[arg(long, env = "TETHER_TOKEN_TTL", default_value_t = 60)]
        token_ttl: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            addr,
            mode,
            max_clients,
            min_clients,
            max_retries,
            broadcast_scope,
            queue_ttl,
            token_ttl,
        } => {
            let room = RoomConfig::default()
                .with_max_clients(max_clients)
                .with_min_clients(min_clients)
                .with_max_retries(max_retries)
                .with_broadcast_scope(broadcast_scope.into())
                .with_queue_ttl(Duration::from_secs(queue_ttl));

            serve(ServerConfig {
                addr,
                mode: mode.into(),
                room,
                token_ttl: Duration::from_secs(token_ttl),
            })
            .await?;
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> Result<()> {
    let store = MemoryStore::new();
    let _sweeper = store.spawn_sweeper(config.room.queue_ttl.max(Duration::from_secs(1)));

    info!("Room policy: {:?}", config.room);
    let app = config.router(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;

    println!(
        "{} {} ({} mode)",
        "📡 tether listening on".green().bold(),
        format!("http://{}", config.addr).cyan(),
        config.mode
    );

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;

    Ok(())
}
