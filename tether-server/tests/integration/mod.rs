
use std::sync::Arc;
use tracing::Level;

use tether_server::{PushDelivery, RoomConfig, RoomCoordinator, VersionedStore};

use crate::utils::{ContendedStore, MockPushNotifier};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Push-mode coordinator over a fresh store, with every push captured.
pub fn create_test_room(config: RoomConfig) -> (RoomCoordinator, MockPushNotifier, ContendedStore) {
    let store = ContendedStore::new();
    let notifier = MockPushNotifier::new_stored_only();

    let delivery = PushDelivery::new(Arc::new(notifier.clone()));
    let shared: Arc<dyn VersionedStore> = Arc::new(store.clone());
    let coordinator = RoomCoordinator::new(shared, Arc::new(delivery), config);

    (coordinator, notifier, store)
}
