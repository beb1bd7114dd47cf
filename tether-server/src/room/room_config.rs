use std::time::Duration;

/// Who hears about a newly joined client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BroadcastScope {
    /// Only the members who were already present.
    #[default]
    ExcludeJoiner,
    /// Every member, the joiner included.
    IncludeJoiner,
}

/// Room policy shared by every room served by one coordinator.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub max_clients: usize,
    /// Lifecycle notifications are held back while a room has fewer members.
    pub min_clients: usize,
    /// Attempts per compare-and-swap loop.
    pub max_retries: usize,
    pub broadcast_scope: BroadcastScope,
    /// Idle time after which an undrained pull-mode queue may be dropped.
    pub queue_ttl: Duration,
}

impl RoomConfig {
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    pub fn with_min_clients(mut self, min_clients: usize) -> Self {
        self.min_clients = min_clients;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_broadcast_scope(mut self, scope: BroadcastScope) -> Self {
        self.broadcast_scope = scope;
        self
    }

    pub fn with_queue_ttl(mut self, ttl: Duration) -> Self {
        self.queue_ttl = ttl;
        self
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_clients: 2,
            min_clients: 2,
            max_retries: 5,
            broadcast_scope: BroadcastScope::ExcludeJoiner,
            queue_ttl: Duration::from_secs(300),
        }
    }
}
