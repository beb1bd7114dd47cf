use serde_json::json;
use std::sync::Arc;
use tether_core::SignalMessage;
use tether_server::{MemoryStore, PullState, RoomConfig};

use crate::integration::init_tracing;
use crate::utils::{client, connected, disconnected, relay, room};

async fn inbox(state: &PullState, room_id: &tether_core::RoomId, id: &tether_core::ClientId) -> Vec<SignalMessage> {
    state
        .queue
        .drain_and_return(room_id, id)
        .await
        .unwrap()
        .into_iter()
        .map(|q| q.message)
        .collect()
}

#[tokio::test]
async fn test_pull_lifecycle() {
    init_tracing();

    let state = PullState::new(
        Arc::new(MemoryStore::new()),
        RoomConfig::default().with_max_clients(8),
    );
    let room1 = room("room1");
    let a = client(&room1, "A");
    let b = client(&room1, "B");

    state.coordinator.join(&room1, &a).await.unwrap();
    state.coordinator.join(&room1, &b).await.unwrap();
    assert_eq!(inbox(&state, &room1, &a).await, vec![connected(&b, &[&a, &b])]);
    assert_eq!(inbox(&state, &room1, &b).await, vec![connected(&a, &[&a, &b])]);

    let body = serde_json::to_vec(&json!([[null, "to everyone"], [a.as_str(), "to a"], ["", "again"]])).unwrap();
    let outcomes = state.coordinator.relay_batch(&room1, &b, &body).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        inbox(&state, &room1, &a).await,
        vec![relay(&b, "to everyone"), relay(&b, "to a"), relay(&b, "again")]
    );
    assert!(inbox(&state, &room1, &b).await.is_empty());

    state.coordinator.leave(&room1, &b).await.unwrap();
    assert_eq!(inbox(&state, &room1, &a).await, vec![disconnected(&b, &[&a])]);
}

#[tokio::test]
async fn test_empty_body_is_plain_poll() {
    init_tracing();

    let state = PullState::new(Arc::new(MemoryStore::new()), RoomConfig::default());
    let room1 = room("room1");
    let a = client(&room1, "A");

    let outcomes = state.coordinator.relay_batch(&room1, &a, b"").await.unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(state.coordinator.stats(&room1).await.unwrap().member_count, 0);
}

#[tokio::test]
async fn test_batch_reconnect_marker_rejoins() {
    init_tracing();

    let state = PullState::new(Arc::new(MemoryStore::new()), RoomConfig::default());
    let room1 = room("room1");
    let a = client(&room1, "A");
    let b = client(&room1, "B");
    state.coordinator.join(&room1, &a).await.unwrap();

    let marker = tether_core::RECONNECT_MARKER.as_bytes();
    state.coordinator.relay_batch(&room1, &b, marker).await.unwrap();

    assert_eq!(
        state.coordinator.members(&room1).await.unwrap(),
        vec![a.clone(), b.clone()]
    );
    assert_eq!(inbox(&state, &room1, &b).await, vec![connected(&a, &[&a, &b])]);
}
