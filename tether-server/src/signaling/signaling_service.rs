use crate::signaling::PushNotifier;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tether_core::ClientId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// How long an issued channel token may sit unused before it is dropped.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60);

/// Identifies one WebSocket connection of a client.
pub type ConnectionId = u64;

struct Peer {
    conn: ConnectionId,
    tx: mpsc::UnboundedSender<Message>,
}

struct IssuedToken {
    client_id: ClientId,
    expires_at: Instant,
}

struct SignalingInner {
    peers: DashMap<ClientId, Peer>,
    tokens: DashMap<String, IssuedToken>,
    next_conn: AtomicU64,
    token_ttl: Duration,
}

/// WebSocket push transport: issues channel tokens and keeps one outbound
/// sender per connected client.
///
/// Tokens are single-use and expire after `token_ttl` if no socket claims
/// them. Each socket gets its own [`ConnectionId`], so tearing down a stale
/// socket never unregisters the one that replaced it.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self::with_token_ttl(DEFAULT_TOKEN_TTL)
    }

    pub fn with_token_ttl(token_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                tokens: DashMap::new(),
                next_conn: AtomicU64::new(1),
                token_ttl,
            }),
        }
    }

    pub fn issue_token(&self, client_id: &ClientId) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.inner.tokens.insert(
            token.clone(),
            IssuedToken {
                client_id: client_id.clone(),
                expires_at: Instant::now() + self.inner.token_ttl,
            },
        );
        token
    }

    /// Looks a token up without consuming it.
    pub fn resolve_token(&self, token: &str) -> Option<ClientId> {
        let now = Instant::now();
        self.inner
            .tokens
            .get(token)
            .filter(|issued| now < issued.expires_at)
            .map(|issued| issued.client_id.clone())
    }

    /// Consumes a token. A second claim of the same token finds nothing.
    pub fn take_token(&self, token: &str) -> Option<ClientId> {
        let now = Instant::now();
        self.inner
            .tokens
            .remove(token)
            .filter(|(_, issued)| now < issued.expires_at)
            .map(|(_, issued)| issued.client_id)
    }

    pub fn pending_tokens(&self) -> usize {
        self.inner.tokens.len()
    }

    /// Drops expired tokens. Returns how many were removed.
    pub fn sweep_tokens(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.inner.tokens.retain(|_, issued| {
            let live = now < issued.expires_at;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    pub fn spawn_token_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = service.sweep_tokens();
                if removed > 0 {
                    debug!("Dropped {} unclaimed channel tokens", removed);
                }
            }
        })
    }

    /// Registers the outbound sender of a new socket, replacing any older
    /// socket of the same client.
    pub fn add_peer(&self, client_id: ClientId, tx: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let conn = self.inner.next_conn.fetch_add(1, Ordering::Relaxed);
        if self
            .inner
            .peers
            .insert(client_id.clone(), Peer { conn, tx })
            .is_some()
        {
            debug!("Client {} replaced its previous socket", client_id);
        }
        conn
    }

    /// Unregisters `conn`. Returns false when a newer socket has taken over.
    pub fn remove_peer(&self, client_id: &ClientId, conn: ConnectionId) -> bool {
        self.inner
            .peers
            .remove_if(client_id, |_, peer| peer.conn == conn)
            .is_some()
    }

    pub fn is_connected(&self, client_id: &ClientId) -> bool {
        self.inner.peers.contains_key(client_id)
    }

    pub fn send_text(&self, client_id: &ClientId, text: String) -> bool {
        let Some(peer) = self.inner.peers.get(client_id) else {
            warn!("Attempted to send signal to disconnected client {}", client_id);
            return false;
        };

        match peer.tx.send(Message::Text(text.into())) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send WS message to {}: {:?}", client_id, e);
                false
            }
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushNotifier for SignalingService {
    async fn register(&self, client_id: &ClientId) -> String {
        self.issue_token(client_id)
    }

    async fn send(&self, client_id: &ClientId, message: String) -> bool {
        self.send_text(client_id, message)
    }
}
