use crate::error::SignalingResult;
use crate::room::Delivery;
use crate::signaling::PushNotifier;
use async_trait::async_trait;
use std::sync::Arc;
use tether_core::{ClientId, RoomId, SignalMessage};

/// [`Delivery`] over a [`PushNotifier`].
#[derive(Clone)]
pub struct PushDelivery {
    notifier: Arc<dyn PushNotifier>,
}

impl PushDelivery {
    pub fn new(notifier: Arc<dyn PushNotifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Delivery for PushDelivery {
    async fn deliver(
        &self,
        _room_id: &RoomId,
        recipients: &[ClientId],
        message: &SignalMessage,
    ) -> SignalingResult<usize> {
        let json = message.to_json()?;
        let mut delivered = 0;
        for client_id in recipients {
            if self.notifier.send(client_id, json.clone()).await {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}
