//! Key/value/TTL contract shared by cache backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pose_models::{CacheNamespace, EntryMeta};

use crate::error::StorageResult;

/// A serialized payload with its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub payload: String,
    pub meta: EntryMeta,
}

/// Backend for the pose cache.
///
/// Every operation is atomic per key. Payloads are opaque strings; typed
/// records are serialized by the cache manager.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch an entry and record the hit in one step.
    ///
    /// Bumps `last_accessed` to `now` and increments `access_count`.
    async fn get_and_touch(
        &self,
        namespace: CacheNamespace,
        key: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<StoredEntry>>;

    /// Insert or replace an entry.
    ///
    /// An existing entry keeps its `created_at`; its payload is replaced and
    /// `last_accessed` set to `now`. Namespaces that count writes as
    /// accesses also increment `access_count`.
    async fn upsert(
        &self,
        namespace: CacheNamespace,
        key: &str,
        payload: String,
        now: DateTime<Utc>,
    ) -> StorageResult<EntryMeta>;

    /// Delete entries whose `last_accessed` is strictly before `cutoff`.
    ///
    /// Returns the number of entries removed.
    async fn delete_idle_before(
        &self,
        namespace: CacheNamespace,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<u64>;

    /// Number of entries currently held in a namespace.
    async fn len(&self, namespace: CacheNamespace) -> StorageResult<u64>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}
