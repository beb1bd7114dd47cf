use crate::error::SignalingResult;
use async_trait::async_trait;
use tether_core::{ClientId, RoomId, SignalMessage};

/// Outbound side of a [`crate::RoomCoordinator`]: push to open transports
/// or park in per-client queues.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Hands `message` to every recipient. Returns how many accepted it.
    async fn deliver(
        &self,
        room_id: &RoomId,
        recipients: &[ClientId],
        message: &SignalMessage,
    ) -> SignalingResult<usize>;
}
