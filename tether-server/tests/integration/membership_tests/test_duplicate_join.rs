use tether_server::{JoinOutcome, RoomConfig};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{client, room};

#[tokio::test]
async fn test_duplicate_join() {
    init_tracing();

    let (coordinator, notifier, _store) = create_test_room(RoomConfig::default());
    let lobby = room("lobby");
    let a = client(&lobby, "A");
    let b = client(&lobby, "B");

    coordinator.join(&lobby, &a).await.unwrap();
    coordinator.join(&lobby, &b).await.unwrap();
    let members = coordinator.members(&lobby).await.unwrap();
    let pushed = notifier.count().await;

    let outcome = coordinator.join(&lobby, &b).await.unwrap();

    assert_eq!(
        outcome,
        JoinOutcome::AlreadyMember {
            members: members.clone()
        }
    );
    assert_eq!(coordinator.members(&lobby).await.unwrap(), members);
    assert_eq!(notifier.count().await, pushed, "no duplicate notifications");
}

#[tokio::test]
async fn test_member_rejoining_full_room_is_not_refused() {
    init_tracing();

    let (coordinator, notifier, _store) = create_test_room(RoomConfig::default().with_max_clients(1));
    let lobby = room("lobby");
    let a = client(&lobby, "A");

    coordinator.join(&lobby, &a).await.unwrap();
    let outcome = coordinator.join(&lobby, &a).await.unwrap();

    assert!(matches!(outcome, JoinOutcome::AlreadyMember { .. }));
    assert!(notifier.messages_for(&a).await.is_empty());
}
