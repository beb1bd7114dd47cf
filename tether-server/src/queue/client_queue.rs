use crate::error::{SignalingError, SignalingResult};
use crate::room::Delivery;
use crate::store::{ListEntry, SetOps, StoreError, VersionedStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ClientId, RoomId, SignalMessage};
use tracing::{debug, info};

pub fn queue_key(room_id: &RoomId, client_id: &ClientId) -> String {
    format!("tether:{}:{}:messages", room_id, client_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub message: SignalMessage,
    pub enqueued_at: DateTime<Utc>,
}

/// Per-client mailboxes for pull-mode delivery.
///
/// Queues are best effort: each append refreshes an idle TTL and a queue
/// nobody drains before it runs out is simply gone.
#[derive(Clone)]
pub struct ClientQueue {
    ops: SetOps,
    ttl: Duration,
}

impl ClientQueue {
    pub fn new(store: Arc<dyn VersionedStore>, max_retries: usize, ttl: Duration) -> Self {
        Self {
            ops: SetOps::new(store, max_retries),
            ttl,
        }
    }

    /// Appends `message` to the tail of the client's queue. Returns whether it
    /// was queued, which is always the case when no error comes back.
    pub async fn enqueue(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
        message: &SignalMessage,
    ) -> SignalingResult<bool> {
        let key = queue_key(room_id, client_id);
        let entry = ListEntry::now(message.to_json()?);
        let depth = self
            .ops
            .append_to_list(&key, vec![entry], Some(self.ttl))
            .await?;
        debug!("Queued message for {} ({} pending)", client_id, depth);
        Ok(depth > 0)
    }

    /// Queues `message` for each recipient. Returns whether anything was
    /// queued at all; an empty recipient list is not an error.
    pub async fn send(
        &self,
        room_id: &RoomId,
        recipients: &[ClientId],
        message: &SignalMessage,
    ) -> SignalingResult<bool> {
        let mut queued = false;
        for client_id in recipients {
            queued |= self.enqueue(room_id, client_id, message).await?;
        }
        Ok(queued)
    }

    /// Takes every pending message for `client_id`, oldest first.
    pub async fn drain_and_return(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> SignalingResult<Vec<QueuedMessage>> {
        let key = queue_key(room_id, client_id);
        let entries = self.ops.drain_list(&key).await?;
        if !entries.is_empty() {
            info!("Delivering {} queued messages to {}", entries.len(), client_id);
        }

        entries
            .into_iter()
            .map(|entry| {
                let message = serde_json::from_str(&entry.payload).map_err(|e| {
                    SignalingError::Store(StoreError::Corrupt {
                        key: key.clone(),
                        reason: e.to_string(),
                    })
                })?;
                Ok(QueuedMessage {
                    message,
                    enqueued_at: entry.enqueued_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Delivery for ClientQueue {
    async fn deliver(
        &self,
        room_id: &RoomId,
        recipients: &[ClientId],
        message: &SignalMessage,
    ) -> SignalingResult<usize> {
        self.send(room_id, recipients, message).await?;
        Ok(recipients.len())
    }
}
