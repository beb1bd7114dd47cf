use tether_server::{LeaveOutcome, RoomConfig, VersionedStore, members_key};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{client, room};

#[tokio::test]
async fn test_last_leave_closes_room() {
    init_tracing();

    let (coordinator, notifier, store) = create_test_room(RoomConfig::default());
    let lobby = room("lobby");
    let a = client(&lobby, "A");
    let b = client(&lobby, "B");

    coordinator.join(&lobby, &a).await.unwrap();
    coordinator.join(&lobby, &b).await.unwrap();
    coordinator.leave(&lobby, &a).await.unwrap();
    notifier.clear().await;

    let outcome = coordinator.leave(&lobby, &b).await.unwrap();

    assert_eq!(outcome, LeaveOutcome::RoomClosed);
    assert_eq!(notifier.count().await, 0);
    // No empty room left behind in the store.
    let entry = store.read(&members_key(&lobby)).await.unwrap();
    assert!(entry.value.is_none());

    let stats = coordinator.stats(&lobby).await.unwrap();
    let never_existed = coordinator.stats(&room("never-created")).await.unwrap();
    assert_eq!(stats, never_existed);
    assert_eq!(stats.member_count, 0);
}
