use tether_server::{JoinOutcome, RoomConfig};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{client, connected, full, room};

#[tokio::test]
async fn test_lobby_capacity() {
    init_tracing();

    let (coordinator, notifier, _store) = create_test_room(RoomConfig::default().with_max_clients(2));
    let lobby = room("lobby");
    let a = client(&lobby, "A");
    let b = client(&lobby, "B");
    let c = client(&lobby, "C");

    // A alone: below the notification threshold.
    coordinator.join(&lobby, &a).await.unwrap();
    assert_eq!(coordinator.members(&lobby).await.unwrap(), vec![a.clone()]);
    assert_eq!(notifier.count().await, 0);

    // B joins: each side learns about the other.
    coordinator.join(&lobby, &b).await.unwrap();
    assert_eq!(
        coordinator.members(&lobby).await.unwrap(),
        vec![a.clone(), b.clone()]
    );
    assert_eq!(
        notifier.messages_for(&a).await,
        vec![connected(&b, &[&a, &b])]
    );
    assert_eq!(
        notifier.messages_for(&b).await,
        vec![connected(&a, &[&a, &b])]
    );

    // C is turned away with exactly one `full`.
    notifier.clear().await;
    let outcome = coordinator.join(&lobby, &c).await.unwrap();
    assert_eq!(
        outcome,
        JoinOutcome::Full {
            members: vec![a.clone(), b.clone()]
        }
    );
    assert_eq!(notifier.messages_for(&c).await, vec![full(&[&a, &b])]);
    assert_eq!(notifier.count().await, 1);
    assert_eq!(coordinator.stats(&lobby).await.unwrap().member_count, 2);
}
