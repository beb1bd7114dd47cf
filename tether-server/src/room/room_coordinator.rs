use crate::error::{SignalingError, SignalingResult};
use crate::room::{BroadcastScope, Delivery, RoomConfig};
use crate::store::{AddOutcome, RemoveOutcome, SetOps, StoreError, VersionedStore};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tether_core::{ClientId, RECONNECT_MARKER, RoomId, RoomStats, SignalMessage};
use tracing::{debug, info, warn};

pub fn members_key(room_id: &RoomId) -> String {
    format!("tether:{}:clients", room_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { members: Vec<ClientId> },
    AlreadyMember { members: Vec<ClientId> },
    /// Nothing changed; the requester was sent a `full` message.
    Full { members: Vec<ClientId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left { remaining: Vec<ClientId> },
    /// The last member left and the room is gone.
    RoomClosed,
    NotMember,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Relayed { recipients: usize },
    /// Targeted relay to a client outside the room.
    Dropped,
    /// The sender was re-admitted instead of relaying.
    Rejoined(JoinOutcome),
}

/// One `[to, data]` pair of a pull-mode batch. An empty or null `to` means
/// "everyone but me".
#[derive(Debug, Deserialize)]
struct BatchItem(Option<String>, Value);

/// Membership and relay logic for every room stored in one
/// [`VersionedStore`].
///
/// Holds no per-room state of its own, so any number of coordinators (in
/// this process or others) may serve the same rooms concurrently.
#[derive(Clone)]
pub struct RoomCoordinator {
    ops: SetOps,
    delivery: Arc<dyn Delivery>,
    config: RoomConfig,
}

impl RoomCoordinator {
    pub fn new(
        store: Arc<dyn VersionedStore>,
        delivery: Arc<dyn Delivery>,
        config: RoomConfig,
    ) -> Self {
        Self {
            ops: SetOps::new(store, config.max_retries),
            delivery,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub async fn members(&self, room_id: &RoomId) -> SignalingResult<Vec<ClientId>> {
        let key = members_key(room_id);
        client_ids(&key, self.ops.read_set(&key).await?)
    }

    pub async fn stats(&self, room_id: &RoomId) -> SignalingResult<RoomStats> {
        let key = members_key(room_id);
        Ok(RoomStats {
            member_count: self.ops.read_set(&key).await?.len(),
        })
    }

    pub async fn join(&self, room_id: &RoomId, client_id: &ClientId) -> SignalingResult<JoinOutcome> {
        let key = members_key(room_id);
        let outcome = self
            .ops
            .add_to_set_bounded(&key, client_id.as_str(), Some(self.config.max_clients))
            .await?;

        match outcome {
            AddOutcome::AlreadyPresent(current) => {
                warn!("Client {} already in room {}", client_id, room_id);
                Ok(JoinOutcome::AlreadyMember {
                    members: client_ids(&key, current)?,
                })
            }
            AddOutcome::AtCapacity(current) => {
                warn!("Room {} is full, turning away {}", room_id, client_id);
                let members = client_ids(&key, current)?;
                let full = SignalMessage::Full {
                    clients: members.clone(),
                };
                self.delivery
                    .deliver(room_id, std::slice::from_ref(client_id), &full)
                    .await?;
                Ok(JoinOutcome::Full { members })
            }
            AddOutcome::Added { before, after } => {
                if before.is_empty() {
                    info!("Creating new room: {}", room_id);
                }
                let peers = client_ids(&key, before)?;
                let members = client_ids(&key, after)?;
                info!(
                    "Added {} to room {} ({} members)",
                    client_id,
                    room_id,
                    members.len()
                );

                if members.len() < self.config.min_clients {
                    debug!(
                        "Room {} below {} members, holding back notifications",
                        room_id, self.config.min_clients
                    );
                } else {
                    self.announce_join(room_id, client_id, &peers, &members)
                        .await?;
                }

                Ok(JoinOutcome::Joined { members })
            }
        }
    }

    async fn announce_join(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
        peers: &[ClientId],
        members: &[ClientId],
    ) -> SignalingResult<()> {
        // The joiner learns about everyone already present...
        for peer in peers {
            let msg = SignalMessage::Connected {
                peer: peer.clone(),
                clients: members.to_vec(),
            };
            self.delivery
                .deliver(room_id, std::slice::from_ref(client_id), &msg)
                .await?;
        }

        // ...then the room learns about the joiner.
        let recipients = match self.config.broadcast_scope {
            BroadcastScope::ExcludeJoiner => peers,
            BroadcastScope::IncludeJoiner => members,
        };
        let msg = SignalMessage::Connected {
            peer: client_id.clone(),
            clients: members.to_vec(),
        };
        self.delivery.deliver(room_id, recipients, &msg).await?;

        Ok(())
    }

    pub async fn leave(&self, room_id: &RoomId, client_id: &ClientId) -> SignalingResult<LeaveOutcome> {
        let key = members_key(room_id);

        match self.ops.remove_from_set(&key, client_id.as_str()).await? {
            RemoveOutcome::Absent => {
                warn!("Client {} not in room {}", client_id, room_id);
                Ok(LeaveOutcome::NotMember)
            }
            RemoveOutcome::Removed { remaining } if remaining.is_empty() => {
                info!("Removed {} from room {}; room closed", client_id, room_id);
                Ok(LeaveOutcome::RoomClosed)
            }
            RemoveOutcome::Removed { remaining } => {
                let remaining = client_ids(&key, remaining)?;
                info!(
                    "Removed {} from room {} ({} members)",
                    client_id,
                    room_id,
                    remaining.len()
                );

                let msg = SignalMessage::Disconnected {
                    peer: client_id.clone(),
                    clients: remaining.clone(),
                };
                self.delivery.deliver(room_id, &remaining, &msg).await?;

                Ok(LeaveOutcome::Left { remaining })
            }
        }
    }

    /// Forwards `payload` from `from_id` to `to_id`, or to every other member
    /// when `to_id` is `None`.
    ///
    /// A sender who is not a member and sends the reconnect marker is joined
    /// instead.
    pub async fn relay(
        &self,
        room_id: &RoomId,
        from_id: &ClientId,
        to_id: Option<&ClientId>,
        payload: Value,
    ) -> SignalingResult<RelayOutcome> {
        let members = self.members(room_id).await?;

        if is_reconnect(&payload) && !members.contains(from_id) {
            info!("Client {} reconnecting to room {}", from_id, room_id);
            return self.join(room_id, from_id).await.map(RelayOutcome::Rejoined);
        }

        if members.is_empty() {
            return Err(SignalingError::RoomNotFound(room_id.clone()));
        }

        let recipients: Vec<ClientId> = match to_id {
            None => members.into_iter().filter(|c| c != from_id).collect(),
            Some(to) if members.contains(to) => vec![to.clone()],
            Some(to) => {
                warn!(
                    "Dropping relay from {} to {}: not in room {}",
                    from_id, to, room_id
                );
                return Ok(RelayOutcome::Dropped);
            }
        };

        let msg = SignalMessage::Relay {
            from: from_id.clone(),
            data: payload,
        };
        let delivered = self.delivery.deliver(room_id, &recipients, &msg).await?;
        debug!(
            "Relayed from {} in room {} to {}/{} recipients",
            from_id,
            room_id,
            delivered,
            recipients.len()
        );

        Ok(RelayOutcome::Relayed {
            recipients: delivered,
        })
    }

    /// Pull-mode relay. `body` is empty (plain poll), the reconnect marker,
    /// or a JSON list of `[to, data]` pairs relayed in order.
    pub async fn relay_batch(
        &self,
        room_id: &RoomId,
        from_id: &ClientId,
        body: &[u8],
    ) -> SignalingResult<Vec<RelayOutcome>> {
        if body.is_empty() {
            return Ok(Vec::new());
        }

        if SignalMessage::is_reconnect(body) {
            let members = self.members(room_id).await?;
            if members.contains(from_id) {
                debug!("Ignoring reconnect from current member {}", from_id);
                return Ok(Vec::new());
            }
            info!("Client {} reconnecting to room {}", from_id, room_id);
            let joined = self.join(room_id, from_id).await?;
            return Ok(vec![RelayOutcome::Rejoined(joined)]);
        }

        let items: Vec<BatchItem> = serde_json::from_slice(body)
            .map_err(|e| SignalingError::MalformedBatch(e.to_string()))?;

        let mut outcomes = Vec::with_capacity(items.len());
        for BatchItem(to, data) in items {
            let to = match to.filter(|to| !to.is_empty()) {
                Some(to) => Some(ClientId::new(to)?),
                None => None,
            };
            outcomes.push(self.relay(room_id, from_id, to.as_ref(), data).await?);
        }

        Ok(outcomes)
    }
}

fn is_reconnect(payload: &Value) -> bool {
    matches!(payload, Value::String(s) if s == RECONNECT_MARKER)
}

fn client_ids(key: &str, set: BTreeSet<String>) -> SignalingResult<Vec<ClientId>> {
    set.into_iter()
        .map(|id| {
            ClientId::new(id).map_err(|e| {
                SignalingError::Store(StoreError::Corrupt {
                    key: key.to_owned(),
                    reason: e.to_string(),
                })
            })
        })
        .collect()
}
