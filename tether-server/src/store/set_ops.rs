use crate::error::{SignalingError, SignalingResult};
use crate::store::{ListEntry, StoreError, StoredValue, VersionedStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// What a mutation closure decided after looking at the current value.
pub enum Mutation<R> {
    /// Compare-and-swap `value` in (`None` deletes) and return `R` on success.
    Write(Option<StoredValue>, R),
    /// Leave the key alone and return `R` right away.
    Keep(R),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added {
        before: BTreeSet<String>,
        after: BTreeSet<String>,
    },
    AlreadyPresent(BTreeSet<String>),
    /// The set already held `capacity` items.
    AtCapacity(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The item was removed. An empty `remaining` means the key was deleted.
    Removed { remaining: BTreeSet<String> },
    Absent,
}

/// Bounded compare-and-swap loops over a [`VersionedStore`].
///
/// Every helper re-reads the key on each attempt and re-runs its decision
/// against that fresh value, so nothing computed from a stale read is ever
/// written. There is no backoff between attempts.
#[derive(Clone)]
pub struct SetOps {
    store: Arc<dyn VersionedStore>,
    max_retries: usize,
}

impl SetOps {
    pub fn new(store: Arc<dyn VersionedStore>, max_retries: usize) -> Self {
        Self {
            store,
            max_retries: max_retries.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn VersionedStore> {
        &self.store
    }

    pub async fn mutate<R, F>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        mut decide: F,
    ) -> SignalingResult<R>
    where
        F: FnMut(Option<&StoredValue>) -> Result<Mutation<R>, StoreError> + Send,
        R: Send,
    {
        for attempt in 1..=self.max_retries {
            let current = self.store.read(key).await?;

            match decide(current.value.as_ref())? {
                Mutation::Keep(result) => return Ok(result),
                Mutation::Write(next, result) => {
                    if self
                        .store
                        .write_if_match(key, next, current.version, ttl)
                        .await?
                    {
                        return Ok(result);
                    }
                    debug!(
                        "Lost CAS race on {} (attempt {}/{})",
                        key, attempt, self.max_retries
                    );
                }
            }
        }

        error!(
            "Failed to update {} after {} attempts",
            key, self.max_retries
        );
        Err(SignalingError::ContentionExceeded {
            key: key.to_owned(),
            attempts: self.max_retries,
        })
    }

    pub async fn read_set(&self, key: &str) -> SignalingResult<BTreeSet<String>> {
        let current = self.store.read(key).await?;
        Ok(StoredValue::set_or_empty(current.value.as_ref(), key)?)
    }

    pub async fn add_to_set(&self, key: &str, item: &str) -> SignalingResult<AddOutcome> {
        self.add_to_set_bounded(key, item, None).await
    }

    /// Like [`SetOps::add_to_set`], but refuses to grow the set past
    /// `capacity`. The capacity test runs against the same read the write is
    /// conditioned on.
    pub async fn add_to_set_bounded(
        &self,
        key: &str,
        item: &str,
        capacity: Option<usize>,
    ) -> SignalingResult<AddOutcome> {
        self.mutate(key, None, |value| {
            let before = StoredValue::set_or_empty(value, key)?;
            if before.contains(item) {
                return Ok(Mutation::Keep(AddOutcome::AlreadyPresent(before)));
            }
            if capacity.is_some_and(|cap| before.len() >= cap) {
                return Ok(Mutation::Keep(AddOutcome::AtCapacity(before)));
            }

            let mut after = before.clone();
            after.insert(item.to_owned());
            Ok(Mutation::Write(
                Some(StoredValue::Set(after.clone())),
                AddOutcome::Added { before, after },
            ))
        })
        .await
    }

    /// Removes `item`, deleting the key in the same write when the set
    /// becomes empty.
    pub async fn remove_from_set(&self, key: &str, item: &str) -> SignalingResult<RemoveOutcome> {
        self.mutate(key, None, |value| {
            let mut remaining = StoredValue::set_or_empty(value, key)?;
            if !remaining.remove(item) {
                return Ok(Mutation::Keep(RemoveOutcome::Absent));
            }

            let next = (!remaining.is_empty()).then(|| StoredValue::Set(remaining.clone()));
            Ok(Mutation::Write(next, RemoveOutcome::Removed { remaining }))
        })
        .await
    }

    /// Reads and clears the set, returning exactly what the clearing write
    /// replaced.
    pub async fn drain_set(&self, key: &str) -> SignalingResult<BTreeSet<String>> {
        self.mutate(key, None, |value| {
            let snapshot = StoredValue::set_or_empty(value, key)?;
            if value.is_none() {
                return Ok(Mutation::Keep(snapshot));
            }
            Ok(Mutation::Write(None, snapshot))
        })
        .await
    }

    /// Appends `entries` at the tail, refreshing `ttl`. Returns the new length.
    pub async fn append_to_list(
        &self,
        key: &str,
        entries: Vec<ListEntry>,
        ttl: Option<Duration>,
    ) -> SignalingResult<usize> {
        self.mutate(key, ttl, |value| {
            let mut list = StoredValue::list_or_empty(value, key)?;
            list.extend(entries.iter().cloned());
            let len = list.len();
            Ok(Mutation::Write(Some(StoredValue::List(list)), len))
        })
        .await
    }

    pub async fn drain_list(&self, key: &str) -> SignalingResult<Vec<ListEntry>> {
        self.mutate(key, None, |value| {
            let snapshot = StoredValue::list_or_empty(value, key)?;
            if value.is_none() {
                return Ok(Mutation::Keep(snapshot));
            }
            Ok(Mutation::Write(None, snapshot))
        })
        .await
    }
}
