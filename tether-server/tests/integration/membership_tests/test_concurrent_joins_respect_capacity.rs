use std::sync::Arc;
use tether_core::ClientId;
use tether_server::{JoinOutcome, MemoryStore, RoomConfig, RoomCoordinator, SetOps, PushDelivery};
use tokio::task::JoinSet;

use crate::integration::init_tracing;
use crate::utils::{MockPushNotifier, client, room};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_respect_capacity() {
    init_tracing();

    let notifier = MockPushNotifier::new_stored_only();
    let coordinator = RoomCoordinator::new(
        Arc::new(MemoryStore::new()),
        Arc::new(PushDelivery::new(Arc::new(notifier.clone()))),
        RoomConfig::default()
            .with_max_clients(3)
            .with_max_retries(1_000),
    );
    let lobby = room("lobby");

    let mut joins = JoinSet::new();
    for i in 0..16 {
        let coordinator = coordinator.clone();
        let lobby = lobby.clone();
        let id = client(&lobby, &format!("peer-{i:02}"));
        joins.spawn(async move { coordinator.join(&lobby, &id).await });
    }

    let mut joined = 0;
    let mut refused = 0;
    while let Some(result) = joins.join_next().await {
        match result.unwrap().unwrap() {
            JoinOutcome::Joined { .. } => joined += 1,
            JoinOutcome::Full { .. } => refused += 1,
            JoinOutcome::AlreadyMember { .. } => panic!("ids are distinct"),
        }
    }

    assert_eq!(joined, 3);
    assert_eq!(refused, 13);
    assert_eq!(coordinator.stats(&lobby).await.unwrap().member_count, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_are_not_lost() {
    init_tracing();

    let ops = SetOps::new(Arc::new(MemoryStore::new()), 1_000);
    let lobby = room("lobby");

    let mut adds = JoinSet::new();
    for i in 0..32 {
        let ops = ops.clone();
        let id: ClientId = client(&lobby, &format!("peer-{i:02}"));
        adds.spawn(async move { ops.add_to_set("shared", id.as_str()).await });
    }
    while let Some(result) = adds.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(ops.read_set("shared").await.unwrap().len(), 32);
}
