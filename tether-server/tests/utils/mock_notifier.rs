use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tether_core::{ClientId, SignalMessage};
use tether_server::PushNotifier;
use tokio::sync::{Mutex, mpsc};

/// One captured push.
#[derive(Debug, Clone, PartialEq)]
pub struct Pushed {
    pub to: ClientId,
    pub message: SignalMessage,
}

/// Mock PushNotifier that captures every outgoing signal.
#[derive(Clone)]
pub struct MockPushNotifier {
    /// Channel to stream captured signals.
    tx: mpsc::UnboundedSender<Pushed>,
    /// All captured signals (for verification).
    pushed: Arc<Mutex<Vec<Pushed>>>,
    /// Clients whose channel is closed; sends to them report failure.
    offline: Arc<Mutex<HashSet<ClientId>>>,
}

impl MockPushNotifier {
    /// Create a new MockPushNotifier and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Pushed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Self {
            tx,
            pushed: Arc::new(Mutex::new(Vec::new())),
            offline: Arc::new(Mutex::new(HashSet::new())),
        };
        (notifier, rx)
    }

    /// Create a MockPushNotifier without a receiver (signals are only stored).
    pub fn new_stored_only() -> Self {
        Self::new().0
    }

    pub async fn set_offline(&self, client_id: &ClientId) {
        self.offline.lock().await.insert(client_id.clone());
    }

    /// Everything pushed so far, in order.
    pub async fn all(&self) -> Vec<Pushed> {
        self.pushed.lock().await.clone()
    }

    /// Messages pushed to one client, in order.
    pub async fn messages_for(&self, client_id: &ClientId) -> Vec<SignalMessage> {
        self.pushed
            .lock()
            .await
            .iter()
            .filter(|p| &p.to == client_id)
            .map(|p| p.message.clone())
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.pushed.lock().await.len()
    }

    pub async fn clear(&self) {
        self.pushed.lock().await.clear();
    }
}

impl Default for MockPushNotifier {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl PushNotifier for MockPushNotifier {
    async fn register(&self, client_id: &ClientId) -> String {
        format!("token-for-{}", client_id)
    }

    async fn send(&self, client_id: &ClientId, message: String) -> bool {
        tracing::debug!("[MockPush] send to {}: {}", client_id, message);

        if self.offline.lock().await.contains(client_id) {
            return false;
        }

        let message: SignalMessage =
            serde_json::from_str(&message).expect("server pushed an invalid envelope");
        let pushed = Pushed {
            to: client_id.clone(),
            message,
        };

        self.pushed.lock().await.push(pushed.clone());
        let _ = self.tx.send(pushed);
        true
    }
}
