use crate::store::{ABSENT, StoreError, StoredValue, Version, Versioned, VersionedStore};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

struct Slot {
    value: StoredValue,
    version: Version,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Process-local [`VersionedStore`].
///
/// Versions come from one monotonically increasing counter, so a key that is
/// deleted and recreated never reuses a stamp a stale writer might still hold.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Slot>>,
    next_version: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            next_version: Arc::new(AtomicU64::new(ABSENT + 1)),
        }
    }

    fn stamp(&self) -> Version {
        self.next_version.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, slot| {
            let live = slot.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = store.sweep();
                if removed > 0 {
                    debug!("Swept {} expired store entries", removed);
                }
            }
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionedStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Versioned, StoreError> {
        let now = Instant::now();
        let found = self.entries.get(key).and_then(|slot| {
            slot.is_live(now)
                .then(|| (slot.value.clone(), slot.version))
        });

        Ok(match found {
            Some((value, version)) => Versioned {
                value: Some(value),
                version,
            },
            None => Versioned {
                value: None,
                version: ABSENT,
            },
        })
    }

    async fn write_if_match(
        &self,
        key: &str,
        value: Option<StoredValue>,
        expected: Version,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let expires_at = ttl.map(|ttl| now + ttl);

        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                let current = if occupied.get().is_live(now) {
                    occupied.get().version
                } else {
                    ABSENT
                };
                if current != expected {
                    return Ok(false);
                }

                match value {
                    Some(value) => {
                        let version = self.stamp();
                        *occupied.get_mut() = Slot {
                            value,
                            version,
                            expires_at,
                        };
                    }
                    None => {
                        occupied.remove();
                    }
                }
            }
            Entry::Vacant(vacant) => {
                if expected != ABSENT {
                    return Ok(false);
                }
                if let Some(value) = value {
                    let version = self.stamp();
                    vacant.insert(Slot {
                        value,
                        version,
                        expires_at,
                    });
                }
            }
        }

        Ok(true)
    }
}
