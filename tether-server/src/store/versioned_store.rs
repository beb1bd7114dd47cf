use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

/// Opaque write stamp handed out by a [`VersionedStore`].
pub type Version = u64;

/// Version reported for a key that holds nothing.
pub const ABSENT: Version = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub payload: String,
    pub enqueued_at: DateTime<Utc>,
}

impl ListEntry {
    pub fn now(payload: String) -> Self {
        Self {
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Set(BTreeSet<String>),
    List(Vec<ListEntry>),
}

impl StoredValue {
    fn kind(&self) -> &'static str {
        match self {
            StoredValue::Set(_) => "set",
            StoredValue::List(_) => "list",
        }
    }

    pub fn set_or_empty(value: Option<&StoredValue>, key: &str) -> Result<BTreeSet<String>, StoreError> {
        match value {
            None => Ok(BTreeSet::new()),
            Some(StoredValue::Set(set)) => Ok(set.clone()),
            Some(other) => Err(StoreError::TypeMismatch {
                key: key.to_owned(),
                expected: "set",
                found: other.kind(),
            }),
        }
    }

    pub fn list_or_empty(value: Option<&StoredValue>, key: &str) -> Result<Vec<ListEntry>, StoreError> {
        match value {
            None => Ok(Vec::new()),
            Some(StoredValue::List(list)) => Ok(list.clone()),
            Some(other) => Err(StoreError::TypeMismatch {
                key: key.to_owned(),
                expected: "list",
                found: other.kind(),
            }),
        }
    }
}

/// A read result: the value (if any) and the version to hand back to
/// [`VersionedStore::write_if_match`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: Option<StoredValue>,
    pub version: Version,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key {key} holds a {found}, expected a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("corrupt entry under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Single-key storage with optimistic concurrency. Implementations may be
/// shared by many server instances; no multi-key transactions are assumed.
#[async_trait]
pub trait VersionedStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Versioned, StoreError>;

    /// Installs `value` iff the key is still at `expected`. `None` deletes the
    /// key. A `ttl` makes the entry read as absent once it elapses without
    /// another write.
    async fn write_if_match(
        &self,
        key: &str,
        value: Option<StoredValue>,
        expected: Version,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError>;
}
