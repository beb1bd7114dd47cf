use crate::http::{pull_router, push_router};
use crate::queue::ClientQueue;
use crate::room::{RoomConfig, RoomCoordinator};
use crate::signaling::{DEFAULT_TOKEN_TTL, PushDelivery, SignalingService};
use crate::store::VersionedStore;
use axum::Router;
use axum::extract::FromRef;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// How room notifications reach clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Over an open WebSocket.
    #[default]
    Push,
    /// Buffered until the client polls.
    Pull,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "push" => Ok(DeliveryMode::Push),
            "pull" | "poll" => Ok(DeliveryMode::Pull),
            other => Err(format!("unknown delivery mode {other:?}, expected push or pull")),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Push => f.write_str("push"),
            DeliveryMode::Pull => f.write_str("pull"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub mode: DeliveryMode,
    pub room: RoomConfig,
    /// Lifetime of a channel token no socket has claimed yet.
    pub token_ttl: Duration,
}

impl ServerConfig {
    /// Builds the router for the configured mode over `store`.
    ///
    /// Push mode also starts the sweeper for unclaimed channel tokens, so this
    /// must run inside a tokio runtime.
    pub fn router(&self, store: Arc<dyn VersionedStore>) -> Router {
        match self.mode {
            DeliveryMode::Push => {
                let signaling = SignalingService::with_token_ttl(self.token_ttl);
                signaling.spawn_token_sweeper(self.token_ttl.max(Duration::from_secs(1)));
                push_router(PushState::with_signaling(store, self.room.clone(), signaling))
            }
            DeliveryMode::Pull => pull_router(PullState::new(store, self.room.clone())),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            mode: DeliveryMode::default(),
            room: RoomConfig::default(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

#[derive(Clone, FromRef)]
pub struct PushState {
    pub coordinator: RoomCoordinator,
    pub signaling: SignalingService,
}

impl PushState {
    pub fn new(store: Arc<dyn VersionedStore>, config: RoomConfig) -> Self {
        Self::with_signaling(store, config, SignalingService::new())
    }

    pub fn with_signaling(
        store: Arc<dyn VersionedStore>,
        config: RoomConfig,
        signaling: SignalingService,
    ) -> Self {
        let delivery = PushDelivery::new(Arc::new(signaling.clone()));
        let coordinator = RoomCoordinator::new(store, Arc::new(delivery), config);
        Self {
            coordinator,
            signaling,
        }
    }
}

#[derive(Clone, FromRef)]
pub struct PullState {
    pub coordinator: RoomCoordinator,
    pub queue: ClientQueue,
}

impl PullState {
    pub fn new(store: Arc<dyn VersionedStore>, config: RoomConfig) -> Self {
        let queue = ClientQueue::new(store.clone(), config.max_retries, config.queue_ttl);
        let coordinator = RoomCoordinator::new(store, Arc::new(queue.clone()), config);
        Self { coordinator, queue }
    }
}
